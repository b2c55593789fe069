//! Taxonomy and model handlers
//!
//! Author: hephaex@gmail.com

use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use entilens_core::EntityLabel;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// One taxonomy label with its display colours
#[derive(Debug, Serialize, ToSchema)]
pub struct LabelInfo {
    pub label: EntityLabel,
    #[schema(example = "People, including fictional")]
    pub description: String,
    /// CSS background used for highlighting
    pub color: String,
    /// Solid colour used in charts
    #[schema(example = "#7ee7f2")]
    pub solid_color: String,
}

impl From<EntityLabel> for LabelInfo {
    fn from(label: EntityLabel) -> Self {
        Self {
            label,
            description: label.description().to_string(),
            color: label.color().to_string(),
            solid_color: label.solid_color().to_string(),
        }
    }
}

/// List the entity taxonomy in display order
#[utoipa::path(
    get,
    path = "/api/v1/labels",
    tag = "labels",
    responses(
        (status = 200, description = "Entity labels", body = Vec<LabelInfo>)
    )
)]
pub async fn list_labels() -> impl IntoResponse {
    let labels: Vec<LabelInfo> = EntityLabel::ALL.iter().copied().map(LabelInfo::from).collect();
    Json(labels)
}

/// A recognition model and whether it can be used now
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelInfo {
    #[schema(example = "en_core_web_sm")]
    pub name: String,
    pub available: bool,
    pub default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsResponse {
    #[schema(example = "builtin")]
    pub default_model: String,
    pub models: Vec<ModelInfo>,
}

/// List registered models with availability
#[utoipa::path(
    get,
    path = "/api/v1/models",
    tag = "labels",
    responses(
        (status = 200, description = "Recognition models", body = ModelsResponse)
    )
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.pipeline.recognizers();
    let default_model = registry.default_model().to_string();

    let models = registry
        .availability()
        .await
        .into_iter()
        .map(|(name, available)| ModelInfo {
            default: name == default_model,
            name,
            available,
        })
        .collect();

    Json(ModelsResponse {
        default_model,
        models,
    })
}
