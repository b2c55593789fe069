//! PDF document parser using pdf-extract
//!
//! Extracts the text layer of every page. Scanned PDFs have no text layer;
//! those come back with blank content and are handed to OCR by the caller.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::{DocumentParseMetadata, DocumentParser, FileType, ParsedDocument, ParserError, Result};

/// PDF document parser
pub struct PdfParser {
    /// Page separator placed between page texts
    pub page_separator: String,
}

impl PdfParser {
    /// Create a new PDF parser with default settings
    pub fn new() -> Self {
        Self {
            page_separator: "\n".to_string(),
        }
    }

    /// Use a different page separator
    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.page_separator = separator.into();
        self
    }

    /// Extract text from PDF bytes
    fn extract_text(&self, bytes: &[u8]) -> Result<(String, Option<u32>)> {
        // pdf-extract panics on some malformed inputs instead of returning an error
        let extracted = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }))
        .map_err(|_| ParserError::PdfError("document structure is malformed".to_string()))?;

        let text = extracted.map_err(|e| ParserError::PdfError(e.to_string()))?;

        // Estimate page count from form feed characters between pages
        let page_count = text.matches('\x0C').count() as u32;
        let page_count = if page_count > 0 {
            Some(page_count + 1)
        } else {
            None
        };

        Ok((self.join_pages(&text), page_count))
    }

    /// Replace page breaks with the configured separator and trim page edges
    fn join_pages(&self, text: &str) -> String {
        text.split('\x0C')
            .map(|page| page.trim_matches('\n'))
            .filter(|page| !page.trim().is_empty())
            .collect::<Vec<_>>()
            .join(&self.page_separator)
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfParser {
    fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<ParsedDocument> {
        let (text, page_count) = self.extract_text(bytes)?;

        let metadata = DocumentParseMetadata {
            page_count,
            word_count: Some(text.split_whitespace().count() as u32),
            ocr_applied: false,
        };

        tracing::debug!(
            file_name,
            chars = text.len(),
            pages = ?page_count,
            "Extracted PDF text layer"
        );

        Ok(ParsedDocument {
            file_name: file_name.to_string(),
            file_type: FileType::Pdf,
            content: text,
            metadata,
        })
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Pdf]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single page PDF drawing `content` with Helvetica
    fn single_page_pdf(content: &str) -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref = pdf.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            tail.push_str(&format!("{offset:010} 00000 n \n"));
        }
        tail.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        ));
        pdf.extend_from_slice(tail.as_bytes());
        pdf
    }

    fn normalize(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_text_layer_extracted() {
        let bytes = single_page_pdf("BT /F1 12 Tf 72 720 Td (Barack Obama visited Berlin.) Tj ET");

        let doc = PdfParser::new().parse_bytes("speech.pdf", &bytes).unwrap();
        assert_eq!(doc.file_type, FileType::Pdf);
        assert!(normalize(&doc.content).contains("Barack Obama visited Berlin."));
        assert_eq!(doc.metadata.word_count, Some(4));
        assert!(!doc.needs_ocr());
    }

    #[test]
    fn test_page_without_text_needs_ocr() {
        let bytes = single_page_pdf("");

        let doc = PdfParser::new().parse_bytes("scan.pdf", &bytes).unwrap();
        assert!(doc.content.trim().is_empty());
        assert!(doc.needs_ocr());
    }

    #[test]
    fn test_pdf_parser_creation() {
        let parser = PdfParser::new();
        assert_eq!(parser.page_separator, "\n");

        let parser = parser.with_page_separator("\n\n");
        assert_eq!(parser.page_separator, "\n\n");
    }

    #[test]
    fn test_join_pages() {
        let parser = PdfParser::new();
        let joined = parser.join_pages("\nFirst page\n\x0C\nSecond page\n\x0C  \n");
        assert_eq!(joined, "First page\nSecond page");
    }

    #[test]
    fn test_garbage_is_pdf_error() {
        let err = PdfParser::new()
            .parse_bytes("junk.pdf", b"%PDF-1.4 truncated")
            .unwrap_err();
        assert!(matches!(err, ParserError::PdfError(_)));
    }

    #[test]
    fn test_supported_types() {
        let parser = PdfParser::new();
        assert!(parser.can_parse(FileType::Pdf));
        assert!(!parser.can_parse(FileType::Docx));
    }
}
