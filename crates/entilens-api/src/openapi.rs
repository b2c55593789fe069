//! OpenAPI document
//!
//! Author: hephaex@gmail.com

use crate::error::ApiError;
use crate::handlers::{extract, health, labels, sessions};
use crate::sessions::SessionSummary;
use axum::{response::IntoResponse, Json};
use entilens_core::{EntityLabel, EntityOccurrence, LabelCount, SessionSnapshot};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EntiLens API",
        description = "Named entity extraction for pasted text and uploaded documents"
    ),
    paths(
        health::health_check,
        health::readiness_check,
        health::metrics,
        labels::list_labels,
        labels::list_models,
        extract::extract_text,
        extract::extract_upload,
        sessions::list_sessions,
        sessions::clear_sessions,
        sessions::get_session,
        sessions::session_table,
        sessions::export_session,
        sessions::session_highlight,
        sessions::session_chart,
    ),
    components(schemas(
        ApiError,
        EntityLabel,
        EntityOccurrence,
        LabelCount,
        SessionSnapshot,
        SessionSummary,
        health::HealthResponse,
        health::BuildInfo,
        health::ReadinessResponse,
        health::ReadinessChecks,
        health::MetricsResponse,
        labels::LabelInfo,
        labels::ModelInfo,
        labels::ModelsResponse,
        extract::ExtractRequest,
        extract::UploadForm,
        extract::ExtractResponse,
        sessions::TableResponse,
        sessions::ClearSessionsResponse,
    )),
    tags(
        (name = "health", description = "Liveness, readiness and metrics"),
        (name = "labels", description = "Entity taxonomy and recognition models"),
        (name = "extract", description = "Entity extraction"),
        (name = "sessions", description = "Saved extractions and their views")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_extraction_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/extract"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/extract/upload"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/sessions/{id}/table"));
    }
}
