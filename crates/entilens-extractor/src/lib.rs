//! Entilens Extractor - Entity extraction pipeline
//!
//! Turns an upload or pasted text into the list of entity occurrences shown
//! to the user:
//! - document text extraction with OCR fallback for scanned PDFs
//! - a call into the selected recognition model (remote spaCy-compatible
//!   service or the offline rule-based recognizer)
//! - filtering of the model output by the user's label selection

pub mod filter;
pub mod ner;
pub mod pipeline;
pub mod registry;
pub mod remote;

pub use filter::filter_entities;
pub use ner::{RuleBasedNer, BUILTIN_MODEL};
pub use pipeline::{
    ExtractedText, ExtractionOutcome, ExtractionPipeline, ExtractionRequest, ExtractionStatus,
    NO_ENTITIES_MESSAGE,
};
pub use registry::RecognizerRegistry;
pub use remote::{install_hint, RemoteNer};
