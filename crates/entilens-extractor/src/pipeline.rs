//! Extraction pipeline
//!
//! Document → text (with OCR fallback) → recognizer → label filter → outcome.
//! Each run is one async task; parsing and OCR are blocking and run on the
//! blocking thread pool.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use entilens_core::{
    count_labels, AppConfig, EntilensError, EntityOccurrence, LabelCount, LabelSelection, Result,
    SessionSnapshot,
};
use entilens_ocr::ScannedPdfOcr;
use entilens_parser::{FileType, ParsedDocument, ParserRegistry};

use crate::filter::filter_entities;
use crate::registry::RecognizerRegistry;

/// Message shown when nothing survives the label filter
pub const NO_ENTITIES_MESSAGE: &str = "No entities found for the selected types.";

// ============================================================================
// Request / Outcome
// ============================================================================

/// One extraction request
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Text to analyze
    pub text: String,
    /// Labels to display
    pub selection: LabelSelection,
    /// Model name, `None` for the default model
    pub model: Option<String>,
    /// Uploaded file name, `None` for pasted text
    pub source: Option<String>,
}

impl ExtractionRequest {
    pub fn new(text: impl Into<String>, selection: LabelSelection) -> Self {
        Self {
            text: text.into(),
            selection,
            model: None,
            source: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Whether any entity survived the label filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Success,
    NoEntities,
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Model that produced the entities
    pub model: String,
    /// Analyzed text
    pub text: String,
    /// Labels that were selected
    pub selection: LabelSelection,
    /// Entities with a selected label, in model order
    pub entities: Vec<EntityOccurrence>,
    /// Number of spans the model returned before filtering
    pub raw_entity_count: usize,
    /// Per-label counts of `entities`
    pub counts: Vec<LabelCount>,
    pub status: ExtractionStatus,
    pub source: Option<String>,
}

impl ExtractionOutcome {
    /// User-facing summary line
    pub fn message(&self) -> String {
        match self.status {
            ExtractionStatus::Success => match self.entities.len() {
                1 => "Found 1 entity.".to_string(),
                n => format!("Found {n} entities."),
            },
            ExtractionStatus::NoEntities => NO_ENTITIES_MESSAGE.to_string(),
        }
    }

    /// Snapshot to keep in the session list
    pub fn to_snapshot(&self) -> SessionSnapshot {
        let snapshot = SessionSnapshot::new(
            self.model.clone(),
            self.text.clone(),
            self.selection.clone(),
            self.entities.clone(),
        );
        match &self.source {
            Some(source) => snapshot.with_source(source.clone()),
            None => snapshot,
        }
    }
}

/// Text recovered from an uploaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub file_type: FileType,
    pub ocr_applied: bool,
    pub page_count: Option<u32>,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs documents and text through recognition
pub struct ExtractionPipeline {
    parsers: Arc<ParserRegistry>,
    ocr: Option<Arc<ScannedPdfOcr>>,
    recognizers: RecognizerRegistry,
}

impl ExtractionPipeline {
    /// Create a pipeline with the default parsers and no OCR
    pub fn new(recognizers: RecognizerRegistry) -> Self {
        Self {
            parsers: Arc::new(ParserRegistry::with_defaults()),
            ocr: None,
            recognizers,
        }
    }

    /// Enable OCR for scanned PDFs
    pub fn with_ocr(mut self, ocr: ScannedPdfOcr) -> Self {
        self.ocr = Some(Arc::new(ocr));
        self
    }

    /// Build recognizers and OCR from application settings
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let pipeline = Self::new(RecognizerRegistry::from_config(&config.ner)?);

        if config.ocr.enabled {
            Ok(pipeline.with_ocr(ScannedPdfOcr::from_config(&config.ocr)))
        } else {
            Ok(pipeline)
        }
    }

    pub fn recognizers(&self) -> &RecognizerRegistry {
        &self.recognizers
    }

    /// OCR is configured and its tools are installed
    pub fn ocr_available(&self) -> bool {
        self.ocr.as_ref().is_some_and(|ocr| ocr.is_available())
    }

    /// Extract the text of an uploaded document
    pub async fn extract_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        ocr_enabled: bool,
    ) -> Result<ExtractedText> {
        let parsers = Arc::clone(&self.parsers);
        let ocr = if ocr_enabled { self.ocr.clone() } else { None };
        let file_name = file_name.to_string();

        tokio::task::spawn_blocking(move || {
            let document = parsers.parse_bytes(&file_name, &bytes)?;
            finish_document(document, &bytes, ocr.as_deref())
        })
        .await
        .map_err(|e| EntilensError::Other(anyhow::anyhow!("Document task failed: {e}")))?
    }

    /// Recognize, filter and summarize
    pub async fn run(&self, request: ExtractionRequest) -> Result<ExtractionOutcome> {
        if request.text.trim().is_empty() {
            return Err(EntilensError::EmptyInput);
        }

        let recognizer = self.recognizers.get(request.model.as_deref())?;
        let model = recognizer.model().to_string();

        tracing::debug!(model = %model, chars = request.text.chars().count(), "Running entity recognition");
        let raw = recognizer.recognize(&request.text).await?;

        let entities = filter_entities(&request.text, &raw, &request.selection);
        let counts = count_labels(&entities);
        let status = if entities.is_empty() {
            ExtractionStatus::NoEntities
        } else {
            ExtractionStatus::Success
        };

        tracing::info!(
            model = %model,
            raw = raw.len(),
            displayed = entities.len(),
            labels = request.selection.len(),
            "Extraction complete"
        );

        Ok(ExtractionOutcome {
            model,
            text: request.text,
            selection: request.selection,
            entities,
            raw_entity_count: raw.len(),
            counts,
            status,
            source: request.source,
        })
    }
}

/// Apply the OCR fallback to a parsed document
fn finish_document(
    document: ParsedDocument,
    bytes: &[u8],
    ocr: Option<&ScannedPdfOcr>,
) -> Result<ExtractedText> {
    let page_count = document.metadata.page_count;

    if !document.needs_ocr() {
        return Ok(ExtractedText {
            text: document.content,
            file_type: document.file_type,
            ocr_applied: false,
            page_count,
        });
    }

    let ocr = ocr.filter(|ocr| ocr.is_available()).ok_or_else(|| {
        EntilensError::DocumentError(
            "PDF has no text layer and OCR is not available".to_string(),
        )
    })?;

    tracing::info!(file = %document.file_name, "PDF has no text layer, running OCR");
    let text = ocr.extract_pdf_text(bytes)?;

    Ok(ExtractedText {
        text,
        file_type: FileType::Pdf,
        ocr_applied: true,
        page_count,
    })
}
