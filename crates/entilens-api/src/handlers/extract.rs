//! Extraction handlers
//!
//! Pasted text arrives as JSON, uploads as multipart form data. Both run the
//! same pipeline, save a session snapshot and return every view the UI needs.
//!
//! Author: hephaex@gmail.com

use crate::error::{ApiError, AppError};
use crate::extractors::{ApiJson, ApiMultipart};
use crate::state::AppState;
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use entilens_core::{EntityLabel, EntityOccurrence, LabelCount, LabelSelection};
use entilens_extractor::{ExtractionRequest, ExtractionStatus};
use entilens_render::{render_bar_chart, render_fragment, ChartOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Extraction request for pasted text
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtractRequest {
    /// Text to analyze
    #[schema(example = "Barack Obama visited Berlin in July 2008.")]
    pub text: String,

    /// Labels to display; omitted selects every label
    #[serde(default)]
    #[schema(example = json!(["PERSON", "GPE"]))]
    pub labels: Option<Vec<String>>,

    /// Model name; omitted uses the default model
    #[serde(default)]
    #[schema(example = "en_core_web_sm")]
    pub model: Option<String>,
}

/// Multipart upload form
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// TXT, PDF or DOCX file; takes precedence over `text`
    #[schema(value_type = Option<String>, format = Binary)]
    file: Option<Vec<u8>>,
    /// Pasted text used when no file is sent
    text: Option<String>,
    /// Repeated field or comma separated list; omitted selects every label
    #[schema(example = "PERSON,ORG")]
    labels: Option<String>,
    model: Option<String>,
    /// Set to `false` to skip OCR for scanned PDFs
    ocr: Option<bool>,
}

/// Extraction result with every view
#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractResponse {
    /// Saved session id
    pub session_id: Uuid,

    #[schema(value_type = String, example = "success")]
    pub status: ExtractionStatus,

    #[schema(example = "Found 2 entities.")]
    pub message: String,

    #[schema(example = "en_core_web_sm")]
    pub model: String,

    /// Uploaded file name
    pub source: Option<String>,

    /// Analyzed text
    pub text: String,

    #[schema(value_type = Vec<EntityLabel>)]
    pub selected_labels: LabelSelection,

    /// Entities with a selected label
    pub entities: Vec<EntityOccurrence>,

    /// Spans returned by the model before filtering
    pub raw_entity_count: usize,

    /// Counts per label, most frequent first
    pub counts: Vec<LabelCount>,

    /// Text was recovered with OCR
    pub ocr_applied: bool,

    /// Highlighted text fragment
    pub highlighted_html: String,

    /// Count chart
    pub chart_svg: String,
}

/// Parse label names, `None` meaning every label
fn parse_labels<S: AsRef<str>>(labels: Option<&[S]>) -> Result<LabelSelection, AppError> {
    match labels {
        None => Ok(LabelSelection::all()),
        Some(names) => {
            let selection = LabelSelection::parse(names.iter().flat_map(|n| n.as_ref().split(',')))
                .map_err(entilens_core::EntilensError::from)?;
            Ok(selection)
        }
    }
}

/// Run the pipeline, save the session and build the response
async fn run_extraction(
    state: &AppState,
    request: ExtractionRequest,
    ocr_applied: bool,
) -> Result<ExtractResponse, AppError> {
    let outcome = state.pipeline.run(request).await?;

    let session_id = state.sessions.save(outcome.to_snapshot()).await;
    state.record_extraction(outcome.entities.len());

    tracing::info!(
        session_id = %session_id,
        model = %outcome.model,
        entities = outcome.entities.len(),
        "Saved extraction session"
    );

    Ok(ExtractResponse {
        session_id,
        status: outcome.status,
        message: outcome.message(),
        highlighted_html: render_fragment(&outcome.text, &outcome.entities),
        chart_svg: render_bar_chart(&outcome.counts, &ChartOptions::default()),
        model: outcome.model,
        source: outcome.source,
        text: outcome.text,
        selected_labels: outcome.selection,
        entities: outcome.entities,
        raw_entity_count: outcome.raw_entity_count,
        counts: outcome.counts,
        ocr_applied,
    })
}

/// Extract entities from pasted text
#[utoipa::path(
    post,
    path = "/api/v1/extract",
    tag = "extract",
    request_body = ExtractRequest,
    responses(
        (status = 200, description = "Extraction result", body = ExtractResponse),
        (status = 400, description = "Empty text, unknown label or malformed JSON", body = ApiError),
        (status = 422, description = "JSON body does not match the request schema", body = ApiError),
        (status = 503, description = "Model not available", body = ApiError)
    )
)]
pub async fn extract_text(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ExtractRequest>,
) -> Result<impl IntoResponse, AppError> {
    let selection = parse_labels(req.labels.as_deref())?;

    let mut request = ExtractionRequest::new(req.text, selection);
    request.model = req.model.filter(|m| !m.trim().is_empty());

    Ok(Json(run_extraction(&state, request, false).await?))
}

/// Extract entities from an uploaded document or pasted text
#[utoipa::path(
    post,
    path = "/api/v1/extract/upload",
    tag = "extract",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extraction result", body = ExtractResponse),
        (status = 400, description = "Empty input, unsupported or corrupt file", body = ApiError),
        (status = 413, description = "Upload exceeds the body limit", body = ApiError),
        (status = 503, description = "Model not available", body = ApiError)
    )
)]
pub async fn extract_upload(
    State(state): State<Arc<AppState>>,
    ApiMultipart(mut multipart): ApiMultipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut text: Option<String> = None;
    let mut labels: Option<Vec<String>> = None;
    let mut model: Option<String> = None;
    let mut ocr = true;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen
                if !file_name.is_empty() || !bytes.is_empty() {
                    file = Some((file_name, bytes.to_vec()));
                }
            }
            "text" => text = Some(field.text().await?),
            "labels" => {
                let value = field.text().await?;
                labels.get_or_insert_with(Vec::new).push(value);
            }
            "model" => model = Some(field.text().await?).filter(|m| !m.trim().is_empty()),
            "ocr" => {
                ocr = !matches!(
                    field.text().await?.trim().to_ascii_lowercase().as_str(),
                    "false" | "0" | "off" | "no"
                )
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let selection = parse_labels(labels.as_deref())?;

    let (text, source, ocr_applied) = match file {
        Some((file_name, bytes)) => {
            tracing::info!(file = %file_name, bytes = bytes.len(), "Extracting uploaded document");
            let extracted = state
                .pipeline
                .extract_document(&file_name, bytes, ocr)
                .await?;
            (extracted.text, Some(file_name), extracted.ocr_applied)
        }
        None => (text.unwrap_or_default(), None, false),
    };

    let mut request = ExtractionRequest::new(text, selection);
    request.model = model;
    request.source = source;

    Ok(Json(run_extraction(&state, request, ocr_applied).await?))
}
