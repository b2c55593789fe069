//! Entilens Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout Entilens:
//! - The fixed entity label taxonomy and label selections
//! - Entity occurrences as produced by a recognition model
//! - Session snapshots kept for the lifetime of the process
//! - Common error types
//! - The recognizer trait implemented by NER backends
//! - Configuration management

pub mod config;
pub mod label;

pub use config::{
    AppConfig, ConfigError, LoggingConfig, NerConfig, OcrConfig, ServerConfig, SessionConfig,
};
pub use label::{EntityLabel, LabelSelection, UnknownLabel};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Entilens operations
#[derive(Error, Debug)]
pub enum EntilensError {
    #[error("No text to analyze: the input is empty")]
    EmptyInput,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not read document: {0}")]
    DocumentError(String),

    #[error("Model {model} is not available: {reason}")]
    ModelUnavailable { model: String, reason: String },

    #[error("Entity recognition failed: {0}")]
    RecognitionError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<UnknownLabel> for EntilensError {
    fn from(err: UnknownLabel) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<ConfigError> for EntilensError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EntilensError>;

// ============================================================================
// Entity Models
// ============================================================================

/// A span exactly as the recognition model reported it
///
/// The label is kept as a string because models emit labels outside the
/// displayed taxonomy (TIME, ORDINAL, FAC, LAW, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntity {
    /// Surface text of the span
    pub text: String,

    /// Start character offset (inclusive)
    pub start: usize,

    /// End character offset (exclusive)
    pub end: usize,

    /// Model label
    pub label: String,
}

impl RawEntity {
    pub fn new(text: impl Into<String>, start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            label: label.into(),
        }
    }
}

/// An entity occurrence whose label belongs to the taxonomy
///
/// Offsets count characters, not bytes, and are half-open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EntityOccurrence {
    /// Surface text of the span
    #[cfg_attr(feature = "openapi", schema(example = "Barack Obama"))]
    pub text: String,

    /// Start character offset (inclusive)
    #[cfg_attr(feature = "openapi", schema(example = 0))]
    pub start: usize,

    /// End character offset (exclusive)
    #[cfg_attr(feature = "openapi", schema(example = 12))]
    pub end: usize,

    /// Taxonomy label
    pub label: EntityLabel,
}

impl EntityOccurrence {
    pub fn new(text: impl Into<String>, start: usize, end: usize, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            label,
        }
    }

    /// Number of characters covered
    pub fn char_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check whether two occurrences share at least one character
    pub fn overlaps(&self, other: &EntityOccurrence) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Number of occurrences of one label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LabelCount {
    pub label: EntityLabel,
    pub count: usize,
}

/// Count occurrences per label, most frequent first (ties in taxonomy order)
pub fn count_labels(entities: &[EntityOccurrence]) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = EntityLabel::ALL
        .iter()
        .map(|&label| LabelCount {
            label,
            count: entities.iter().filter(|e| e.label == label).count(),
        })
        .filter(|c| c.count > 0)
        .collect();

    // Stable sort keeps taxonomy order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

// ============================================================================
// Text Offsets
// ============================================================================

/// Convert a byte range of `text` into a character range
///
/// Returns `None` when either bound is not on a character boundary.
pub fn byte_range_to_chars(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    if start > end || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return None;
    }
    let char_start = text[..start].chars().count();
    let char_end = char_start + text[start..end].chars().count();
    Some((char_start, char_end))
}

/// Slice `text` by character offsets
pub fn slice_chars(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let byte_start = char_to_byte(text, start)?;
    let byte_end = char_to_byte(text, end)?;
    Some(&text[byte_start..byte_end])
}

/// Byte position of the `index`th character (`index == len` maps to the end)
fn char_to_byte(text: &str, index: usize) -> Option<usize> {
    if index == 0 {
        return Some(0);
    }
    match text.char_indices().nth(index) {
        Some((byte, _)) => Some(byte),
        None if text.chars().count() == index => Some(text.len()),
        None => None,
    }
}

// ============================================================================
// Session Snapshots
// ============================================================================

/// A saved extraction, kept in memory for the lifetime of the process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionSnapshot {
    /// Unique identifier
    pub id: Uuid,

    /// When the extraction ran
    pub created_at: DateTime<Utc>,

    /// Uploaded file name, `None` for pasted text
    pub source: Option<String>,

    /// Model used for recognition
    #[cfg_attr(feature = "openapi", schema(example = "en_core_web_sm"))]
    pub model: String,

    /// Analyzed text
    pub text: String,

    /// Labels selected at extraction time
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<EntityLabel>))]
    pub selected_labels: LabelSelection,

    /// Entities that passed the label filter
    pub entities: Vec<EntityOccurrence>,
}

impl SessionSnapshot {
    /// Create a new snapshot
    pub fn new(
        model: impl Into<String>,
        text: impl Into<String>,
        selected_labels: LabelSelection,
        entities: Vec<EntityOccurrence>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source: None,
            model: model.into(),
            text: text.into(),
            selected_labels,
            entities,
        }
    }

    /// Set the source file name
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for named-entity recognition backends
#[async_trait::async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Run the model over `text` and return every span it finds
    async fn recognize(&self, text: &str) -> Result<Vec<RawEntity>>;

    /// Model name for logging and session records
    fn model(&self) -> &str;

    /// Check whether the model can currently be used
    async fn is_available(&self) -> bool {
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
