//! Entilens Render - Views over extracted entities
//!
//! Three views of the same entity list:
//! - a sortable, filterable, paginated table exportable as CSV or JSON
//! - displaCy-style highlighted HTML
//! - an SVG bar chart of counts per label

use thiserror::Error;

pub mod chart;
pub mod highlight;
pub mod table;

pub use chart::{render_bar_chart, ChartOptions, NO_STATS_MESSAGE};
pub use highlight::{render_document, render_fragment, HIGHLIGHT_FILE_NAME};
pub use table::{
    EntityRow, EntityTable, ExportFormat, SortColumn, SortOrder, TablePage, TableQuery,
    DEFAULT_PAGE_SIZE,
};

/// Errors raised while exporting or importing table data
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid UTF-8 in exported CSV: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Unknown {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },
}

impl From<RenderError> for entilens_core::EntilensError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::InvalidValue { .. } => Self::ValidationError(err.to_string()),
            other => Self::Other(anyhow::Error::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
