//! API error handling
//!
//! Author: hephaex@gmail.com

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use entilens_core::EntilensError;
use entilens_render::RenderError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    #[schema(example = "EMPTY_INPUT")]
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("NOT_FOUND", format!("{resource} not found"))
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    EmptyInput(String),
    UnsupportedFormat(String),
    InvalidDocument(String),
    BadRequest(String),
    NotFound(String),
    ModelUnavailable(String),
    Recognition(String),
    Internal(String),
    /// Request rejected before reaching a handler
    Rejected { status: StatusCode, message: String },
}

impl AppError {
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Rejected {
            status,
            message: message.into(),
        }
    }
}

fn rejection_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::UNPROCESSABLE_ENTITY => "INVALID_REQUEST_BODY",
        status if status.is_server_error() => "INTERNAL_ERROR",
        _ => "BAD_REQUEST",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::EmptyInput(msg) => (StatusCode::BAD_REQUEST, ApiError::new("EMPTY_INPUT", msg)),
            AppError::UnsupportedFormat(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("UNSUPPORTED_FORMAT", msg),
            ),
            AppError::InvalidDocument(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_DOCUMENT", msg),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::not_found(&msg)),
            AppError::ModelUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("MODEL_UNAVAILABLE", msg),
            ),
            AppError::Recognition(msg) => (
                StatusCode::BAD_GATEWAY,
                ApiError::new("RECOGNITION_ERROR", "Entity recognition failed").with_details(msg),
            ),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal_error().with_details(msg),
                )
            }
            AppError::Rejected { status, message } => {
                tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
                (status, ApiError::new(rejection_code(status), message))
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<EntilensError> for AppError {
    fn from(err: EntilensError) -> Self {
        match err {
            EntilensError::EmptyInput => AppError::EmptyInput(err.to_string()),
            EntilensError::UnsupportedFormat(_) => AppError::UnsupportedFormat(err.to_string()),
            EntilensError::DocumentError(_) => AppError::InvalidDocument(err.to_string()),
            EntilensError::ValidationError(msg) => AppError::BadRequest(msg),
            EntilensError::NotFound(msg) => AppError::NotFound(msg),
            EntilensError::ModelUnavailable { .. } => AppError::ModelUnavailable(err.to_string()),
            EntilensError::RecognitionError(msg) => AppError::Recognition(msg),
            EntilensError::ConfigError(msg) => {
                AppError::Internal(format!("Configuration error: {msg}"))
            }
            EntilensError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        EntilensError::from(err).into()
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::rejected(
            err.status(),
            format!("Invalid multipart body: {}", err.body_text()),
        )
    }
}
