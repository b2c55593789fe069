//! Entity label taxonomy
//!
//! The label set is fixed by the upstream recognition model (OntoNotes-style
//! labels as emitted by spaCy). Entilens only ever displays labels from this
//! list, in this order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A label from the fixed entity taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    /// People, including fictional
    Person,
    /// Companies, agencies, institutions
    Org,
    /// Countries, cities, states
    Gpe,
    /// Non-GPE locations, mountain ranges, bodies of water
    Loc,
    /// Named hurricanes, battles, wars, sports events
    Event,
    /// Absolute or relative dates or periods
    Date,
    /// Nationalities, religious or political groups
    Norp,
    /// Objects, vehicles, foods (not services)
    Product,
    /// Titles of books, songs
    WorkOfArt,
    /// Any named language
    Language,
    /// Monetary values, including unit
    Money,
    /// Measurements, as of weight or distance
    Quantity,
    /// Percentage, including "%"
    Percent,
    /// Numerals that do not fall under another type
    Cardinal,
}

impl EntityLabel {
    /// Every label, in display order
    pub const ALL: [EntityLabel; 14] = [
        Self::Person,
        Self::Org,
        Self::Gpe,
        Self::Loc,
        Self::Event,
        Self::Date,
        Self::Norp,
        Self::Product,
        Self::WorkOfArt,
        Self::Language,
        Self::Money,
        Self::Quantity,
        Self::Percent,
        Self::Cardinal,
    ];

    /// Label as emitted by the model
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Org => "ORG",
            Self::Gpe => "GPE",
            Self::Loc => "LOC",
            Self::Event => "EVENT",
            Self::Date => "DATE",
            Self::Norp => "NORP",
            Self::Product => "PRODUCT",
            Self::WorkOfArt => "WORK_OF_ART",
            Self::Language => "LANGUAGE",
            Self::Money => "MONEY",
            Self::Quantity => "QUANTITY",
            Self::Percent => "PERCENT",
            Self::Cardinal => "CARDINAL",
        }
    }

    /// CSS background used when highlighting this label
    pub fn color(&self) -> &'static str {
        match self {
            Self::Person => "linear-gradient(90deg, #7ee7f2, #0f62fe)",
            Self::Org => "linear-gradient(90deg, #f28c8c, #e63946)",
            Self::Gpe => "linear-gradient(90deg, #90be6d, #43aa8b)",
            Self::Loc => "linear-gradient(90deg, #f9c74f, #f9844a)",
            Self::Event => "linear-gradient(90deg, #f2c707, #dc9ce7)",
            Self::Date => "linear-gradient(90deg,#aa9cde,#dc9ce7)",
            Self::Norp => "linear-gradient(90deg,#f8961e,#f3722c)",
            Self::Product => "linear-gradient(90deg,#577590,#4d908e)",
            Self::WorkOfArt => "linear-gradient(90deg,#9d4edd,#c77dff)",
            Self::Language => "linear-gradient(90deg,#43aa8b,#90be6d)",
            Self::Money => "linear-gradient(90deg,#f94144,#f3722c)",
            Self::Quantity => "linear-gradient(90deg,#f8961e,#f9c74f)",
            Self::Percent => "linear-gradient(90deg,#90be6d,#43aa8b)",
            Self::Cardinal => "linear-gradient(90deg,#577590,#4d908e)",
        }
    }

    /// Solid colour for contexts that cannot draw gradients (SVG fills)
    pub fn solid_color(&self) -> &'static str {
        match self {
            Self::Person => "#7ee7f2",
            Self::Org => "#f28c8c",
            Self::Gpe => "#90be6d",
            Self::Loc => "#f9c74f",
            Self::Event => "#f2c707",
            Self::Date => "#aa9cde",
            Self::Norp => "#f8961e",
            Self::Product => "#577590",
            Self::WorkOfArt => "#9d4edd",
            Self::Language => "#43aa8b",
            Self::Money => "#f94144",
            Self::Quantity => "#f8961e",
            Self::Percent => "#90be6d",
            Self::Cardinal => "#577590",
        }
    }

    /// Short human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Person => "People, including fictional",
            Self::Org => "Companies, agencies, institutions",
            Self::Gpe => "Countries, cities, states",
            Self::Loc => "Non-GPE locations, mountain ranges, bodies of water",
            Self::Event => "Named hurricanes, battles, wars, sports events",
            Self::Date => "Absolute or relative dates or periods",
            Self::Norp => "Nationalities or religious or political groups",
            Self::Product => "Objects, vehicles, foods",
            Self::WorkOfArt => "Titles of books, songs",
            Self::Language => "Any named language",
            Self::Money => "Monetary values, including unit",
            Self::Quantity => "Measurements, as of weight or distance",
            Self::Percent => "Percentage, including \"%\"",
            Self::Cardinal => "Numerals that do not fall under another type",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not part of the taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown entity label: {0}")]
pub struct UnknownLabel(pub String);

impl std::str::FromStr for EntityLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

// ============================================================================
// Label Selection
// ============================================================================

/// Ordered allow-list of labels chosen by the user
///
/// Duplicates are dropped on construction. The default selects every label,
/// which is what "Select All Entities" restores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<EntityLabel>", into = "Vec<EntityLabel>")]
pub struct LabelSelection {
    labels: Vec<EntityLabel>,
}

impl LabelSelection {
    /// Select every label
    pub fn all() -> Self {
        Self {
            labels: EntityLabel::ALL.to_vec(),
        }
    }

    /// Select nothing
    pub fn none() -> Self {
        Self { labels: Vec::new() }
    }

    /// Build from labels, keeping the first occurrence of each
    pub fn from_labels(labels: impl IntoIterator<Item = EntityLabel>) -> Self {
        let mut selected = Vec::new();
        for label in labels {
            if !selected.contains(&label) {
                selected.push(label);
            }
        }
        Self { labels: selected }
    }

    /// Parse label names; every name must belong to the taxonomy
    pub fn parse<I, S>(names: I) -> Result<Self, UnknownLabel>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels = names
            .into_iter()
            .filter(|name| !name.as_ref().trim().is_empty())
            .map(|name| name.as_ref().parse::<EntityLabel>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_labels(labels))
    }

    /// Parse a comma separated list such as `PERSON,ORG`
    pub fn parse_list(list: &str) -> Result<Self, UnknownLabel> {
        Self::parse(list.split(','))
    }

    pub fn contains(&self, label: EntityLabel) -> bool {
        self.labels.contains(&label)
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityLabel> + '_ {
        self.labels.iter().copied()
    }

    pub fn labels(&self) -> &[EntityLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// True when every taxonomy label is selected
    pub fn is_all(&self) -> bool {
        EntityLabel::ALL.iter().all(|label| self.contains(*label))
    }
}

impl Default for LabelSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Vec<EntityLabel>> for LabelSelection {
    fn from(labels: Vec<EntityLabel>) -> Self {
        Self::from_labels(labels)
    }
}

impl From<LabelSelection> for Vec<EntityLabel> {
    fn from(selection: LabelSelection) -> Self {
        selection.labels
    }
}
