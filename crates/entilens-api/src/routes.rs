//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::{extract, labels, sessions};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Taxonomy and models
        .route("/labels", get(labels::list_labels))
        .route("/models", get(labels::list_models))
        // Extraction
        .route("/extract", post(extract::extract_text))
        .route("/extract/upload", post(extract::extract_upload))
        // Saved sessions
        .route(
            "/sessions",
            get(sessions::list_sessions).delete(sessions::clear_sessions),
        )
        .route("/sessions/:id", get(sessions::get_session))
        .route("/sessions/:id/table", get(sessions::session_table))
        .route("/sessions/:id/export", get(sessions::export_session))
        .route("/sessions/:id/highlight", get(sessions::session_highlight))
        .route("/sessions/:id/chart", get(sessions::session_chart))
}
