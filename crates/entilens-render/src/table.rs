//! Entities table
//!
//! Rows are `Text, Start, End, Label`. A view is the table after the quick
//! filter, the label filter and sorting; exports always cover the whole view,
//! not just the visible page.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use entilens_core::{EntityLabel, EntityOccurrence};

use crate::{RenderError, Result};

/// Rows per page unless a caller asks otherwise
pub const DEFAULT_PAGE_SIZE: usize = 10;

const CSV_HEADER: [&str; 4] = ["Text", "Start", "End", "Label"];

/// One table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRow {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Start")]
    pub start: usize,
    #[serde(rename = "End")]
    pub end: usize,
    #[serde(rename = "Label")]
    pub label: EntityLabel,
}

impl From<&EntityOccurrence> for EntityRow {
    fn from(entity: &EntityOccurrence) -> Self {
        Self {
            text: entity.text.clone(),
            start: entity.start,
            end: entity.end,
            label: entity.label,
        }
    }
}

impl EntityRow {
    fn matches(&self, needle_lower: &str) -> bool {
        self.text.to_lowercase().contains(needle_lower)
            || self.start.to_string().contains(needle_lower)
            || self.end.to_string().contains(needle_lower)
            || self.label.as_str().to_lowercase().contains(needle_lower)
    }
}

// ============================================================================
// Query Types
// ============================================================================

/// Sortable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Text,
    Start,
    End,
    Label,
}

impl SortColumn {
    fn compare(&self, a: &EntityRow, b: &EntityRow) -> Ordering {
        match self {
            Self::Text => a.text.to_lowercase().cmp(&b.text.to_lowercase()),
            Self::Start => a.start.cmp(&b.start),
            Self::End => a.end.cmp(&b.end),
            Self::Label => a.label.as_str().cmp(b.label.as_str()),
        }
    }
}

impl FromStr for SortColumn {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "label" => Ok(Self::Label),
            _ => Err(RenderError::InvalidValue {
                kind: "sort column",
                value: s.to_string(),
            }),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Export file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// Download file name
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Csv => "entities_view.csv",
            Self::Json => "entities_view.json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(RenderError::InvalidValue {
                kind: "export format",
                value: s.to_string(),
            }),
        }
    }
}

/// Filters, sort and page for one table view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub sort: Option<SortColumn>,
    pub order: SortOrder,
    /// Case-insensitive text matched against every column
    pub quick_filter: Option<String>,
    /// Label column filter; empty keeps every label
    pub labels: Vec<EntityLabel>,
    /// 1-indexed page
    pub page: usize,
    pub page_size: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            sort: None,
            order: SortOrder::Asc,
            quick_filter: None,
            labels: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of a table view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePage {
    pub page: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub total_pages: usize,
    pub rows: Vec<EntityRow>,
}

// ============================================================================
// Table
// ============================================================================

/// Table of entity rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTable {
    rows: Vec<EntityRow>,
}

impl EntityTable {
    pub fn from_entities(entities: &[EntityOccurrence]) -> Self {
        Self {
            rows: entities.iter().map(EntityRow::from).collect(),
        }
    }

    pub fn from_rows(rows: Vec<EntityRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[EntityRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable sort on one column
    pub fn sort(&mut self, column: SortColumn, order: SortOrder) {
        self.rows.sort_by(|a, b| {
            let ordering = column.compare(a, b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    /// Rows where any column contains `needle`, ignoring case
    pub fn quick_filter(&self, needle: &str) -> Self {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        Self {
            rows: self
                .rows
                .iter()
                .filter(|row| row.matches(&needle))
                .cloned()
                .collect(),
        }
    }

    /// Rows whose label is one of `labels`
    pub fn filter_labels(&self, labels: &[EntityLabel]) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .filter(|row| labels.contains(&row.label))
                .cloned()
                .collect(),
        }
    }

    /// Apply the filters and sort of `query`, ignoring its page
    pub fn view(&self, query: &TableQuery) -> Self {
        let mut view = match &query.quick_filter {
            Some(needle) => self.quick_filter(needle),
            None => self.clone(),
        };
        if !query.labels.is_empty() {
            view = view.filter_labels(&query.labels);
        }
        if let Some(column) = query.sort {
            view.sort(column, query.order);
        }
        view
    }

    /// Number of pages for `page_size` rows per page
    pub fn page_count(&self, page_size: usize) -> usize {
        self.rows.len().div_ceil(page_size.max(1))
    }

    /// Slice out a 1-indexed page; pages past the end are empty
    pub fn page(&self, page: usize, page_size: usize) -> TablePage {
        let page_size = page_size.max(1);
        let rows = match page.checked_sub(1) {
            Some(index) => self
                .rows
                .iter()
                .skip(index.saturating_mul(page_size))
                .take(page_size)
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        TablePage {
            page,
            page_size,
            total_rows: self.rows.len(),
            total_pages: self.page_count(page_size),
            rows,
        }
    }

    /// Serialize all rows as CSV with a `Text,Start,End,Label` header
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer.write_record(CSV_HEADER)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Parse a CSV export
    pub fn from_csv(data: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows = reader
            .deserialize::<EntityRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    /// Serialize all rows as a JSON array of records
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.rows)?)
    }

    /// Parse a JSON export
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(Self {
            rows: serde_json::from_str(data)?,
        })
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Json => self.to_json(),
        }
    }
}
