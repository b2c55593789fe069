//! DOCX document parser using docx-rs
//!
//! Paragraph texts are joined with newlines in document order. Table rows are
//! emitted in place as tab-separated lines so entities inside tables are
//! still recognized.

use docx_rs::read_docx;

use crate::{DocumentParseMetadata, DocumentParser, FileType, ParsedDocument, ParserError, Result};

/// DOCX document parser
pub struct DocxParser {
    /// Whether table cells are included in the extracted text
    pub include_tables: bool,
}

impl DocxParser {
    /// Create a new DOCX parser with default settings
    pub fn new() -> Self {
        Self {
            include_tables: true,
        }
    }

    /// Include or skip table content
    pub fn with_tables(mut self, enabled: bool) -> Self {
        self.include_tables = enabled;
        self
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenate the text runs of a paragraph, including hyperlinks and
/// tracked insertions
fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    push_children_text(&para.children, &mut text);
    text
}

fn push_children_text(children: &[docx_rs::ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            docx_rs::ParagraphChild::Run(run) => push_run_text(run, text),
            docx_rs::ParagraphChild::Hyperlink(link) => push_children_text(&link.children, text),
            docx_rs::ParagraphChild::Insert(insert) => {
                for child in &insert.children {
                    if let docx_rs::InsertChild::Run(run) = child {
                        push_run_text(run, text);
                    }
                }
            }
            docx_rs::ParagraphChild::MoveTo(moved) => {
                for child in &moved.children {
                    if let docx_rs::MoveToChild::Run(run) = child {
                        push_run_text(run, text);
                    }
                }
            }
            // Deleted and moved-away text is not part of the document
            _ => {}
        }
    }
}

fn push_run_text(run: &docx_rs::Run, text: &mut String) {
    for run_child in &run.children {
        match run_child {
            docx_rs::RunChild::Text(t) => text.push_str(&t.text),
            docx_rs::RunChild::Tab(_) => text.push('\t'),
            _ => {}
        }
    }
}

/// Flatten a table into one tab-separated line per row
fn table_lines(tbl: &docx_rs::Table) -> Vec<String> {
    let mut lines = Vec::new();

    for row in &tbl.rows {
        let docx_rs::TableChild::TableRow(tr) = row;
        let mut cells = Vec::new();

        for cell in &tr.cells {
            let docx_rs::TableRowChild::TableCell(tc) = cell;
            let cell_text = tc
                .children
                .iter()
                .filter_map(|child| match child {
                    docx_rs::TableCellContent::Paragraph(para) => Some(paragraph_text(para)),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" ");
            cells.push(cell_text.trim().to_string());
        }

        if cells.iter().any(|c| !c.is_empty()) {
            lines.push(cells.join("\t"));
        }
    }

    lines
}

impl DocumentParser for DocxParser {
    fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<ParsedDocument> {
        let docx = read_docx(bytes).map_err(|e| ParserError::DocxError(e.to_string()))?;

        let mut lines: Vec<String> = Vec::new();

        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(para) => {
                    lines.push(paragraph_text(para));
                }
                docx_rs::DocumentChild::Table(tbl) if self.include_tables => {
                    lines.extend(table_lines(tbl));
                }
                _ => {}
            }
        }

        let content = lines.join("\n");

        let metadata = DocumentParseMetadata {
            page_count: None,
            word_count: Some(content.split_whitespace().count() as u32),
            ocr_applied: false,
        };

        tracing::debug!(file_name, paragraphs = lines.len(), "Extracted DOCX text");

        Ok(ParsedDocument {
            file_name: file_name.to_string(),
            file_type: FileType::Docx,
            content,
            metadata,
        })
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Docx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{
        Docx, Hyperlink, HyperlinkType, Insert, Paragraph, Run, Table, TableCell, TableRow,
    };

    fn build_docx(docx: Docx) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_docx_parser_creation() {
        let parser = DocxParser::new();
        assert!(parser.include_tables);

        let parser = parser.with_tables(false);
        assert!(!parser.include_tables);
    }

    #[test]
    fn test_paragraphs_joined_with_newlines() {
        let bytes = build_docx(
            Docx::new()
                .add_paragraph(
                    Paragraph::new()
                        .add_run(Run::new().add_text("Ada Lovelace "))
                        .add_run(Run::new().add_text("lived in London.")),
                )
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("She died in 1852."))),
        );

        let doc = DocxParser::new().parse_bytes("bio.docx", &bytes).unwrap();
        assert_eq!(doc.file_type, FileType::Docx);
        assert_eq!(doc.content, "Ada Lovelace lived in London.\nShe died in 1852.");
        assert_eq!(doc.metadata.word_count, Some(9));
    }

    #[test]
    fn test_hyperlink_and_inserted_text_included() {
        let bytes = build_docx(
            Docx::new()
                .add_paragraph(
                    Paragraph::new()
                        .add_run(Run::new().add_text("I work at "))
                        .add_hyperlink(
                            Hyperlink::new("employer", HyperlinkType::Anchor)
                                .add_run(Run::new().add_text("Google")),
                        )
                        .add_run(Run::new().add_text(" today.")),
                )
                .add_paragraph(
                    Paragraph::new()
                        .add_run(Run::new().add_text("Moved to "))
                        .add_insert(Insert::new(Run::new().add_text("Zurich"))),
                ),
        );

        let doc = DocxParser::new().parse_bytes("job.docx", &bytes).unwrap();
        assert_eq!(doc.content, "I work at Google today.\nMoved to Zurich");
    }

    #[test]
    fn test_table_rows_included() {
        let table = Table::new(vec![TableRow::new(vec![
            TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("Google"))),
            TableCell::new()
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Mountain View"))),
        ])]);
        let bytes = build_docx(
            Docx::new()
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Offices:")))
                .add_table(table),
        );

        let doc = DocxParser::new().parse_bytes("offices.docx", &bytes).unwrap();
        assert_eq!(doc.content, "Offices:\nGoogle\tMountain View");

        let doc = DocxParser::new()
            .with_tables(false)
            .parse_bytes("offices.docx", &bytes)
            .unwrap();
        assert_eq!(doc.content, "Offices:");
    }

    #[test]
    fn test_supported_types() {
        let parser = DocxParser::new();
        assert!(parser.can_parse(FileType::Docx));
        assert!(!parser.can_parse(FileType::Pdf));
    }
}
