use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Text shown for cells that carry no value.
pub const MISSING_PLACEHOLDER: &str = "—";

/// Unit suffixes stripped from cell text before attempting a numeric parse.
pub const UNIT_SUFFIXES: [&str; 3] = ["km/h", "%", "V"];

/// Display-formatted scalar held by one cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Missing,
}

impl CellValue {
    /// The text rendered, filtered and sorted for this cell.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(value) => value.to_string(),
            Self::Missing => MISSING_PLACEHOLDER.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(value) => write!(f, "{value}"),
            Self::Missing => f.write_str(MISSING_PLACEHOLDER),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

/// One row of the authoritative dataset. Tags drive conditional styling
/// only; row identity is positional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<CellValue>,
    pub tags: BTreeSet<String>,
}

impl Row {
    #[must_use]
    pub fn new(values: Vec<CellValue>) -> Self {
        Self {
            values,
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn tagged(
        values: Vec<CellValue>,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            values,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&CellValue> {
        self.values.get(index)
    }

    /// Display text of the cell, or empty for an out-of-range index.
    #[must_use]
    pub fn cell_text(&self, index: usize) -> String {
        self.values.get(index).map(CellValue::display).unwrap_or_default()
    }
}

impl From<Vec<CellValue>> for Row {
    fn from(values: Vec<CellValue>) -> Self {
        Self::new(values)
    }
}

impl From<(Vec<CellValue>, &str)> for Row {
    fn from((values, tag): (Vec<CellValue>, &str)) -> Self {
        Self::tagged(values, [tag])
    }
}

impl From<(Vec<CellValue>, String)> for Row {
    fn from((values, tag): (Vec<CellValue>, String)) -> Self {
        Self::tagged(values, [tag])
    }
}

impl From<(Vec<CellValue>, Vec<String>)> for Row {
    fn from((values, tags): (Vec<CellValue>, Vec<String>)) -> Self {
        Self::tagged(values, tags)
    }
}

/// Column definition, fixed at grid construction time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    /// Initial width in points
    pub width: f32,
}

impl Column {
    #[must_use]
    pub fn new(label: impl Into<String>, width: f32) -> Self {
        Self {
            label: label.into(),
            width,
        }
    }
}

/// Which cells a text query matches against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterScope {
    #[default]
    All,
    Column(usize),
}

/// Maps a column label to a filter scope; unknown labels widen to all
/// columns rather than filtering nothing.
#[must_use]
pub fn scope_for_label(columns: &[Column], label: &str) -> FilterScope {
    columns
        .iter()
        .position(|column| column.label == label)
        .map_or(FilterScope::All, FilterScope::Column)
}

/// Live text filter for one grid instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub query: String,
    pub scope: FilterScope,
}

impl FilterState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

/// Sort configuration for one grid instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<usize>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

/// Computes the new sort state when a column header is clicked.
/// - If the column is already the sort column: toggle direction
/// - Otherwise: sort by the clicked column, ascending
#[must_use]
pub fn sort_on_header_click(current: SortState, clicked: usize) -> SortState {
    if current.column == Some(clicked) {
        SortState {
            column: current.column,
            ascending: !current.ascending,
        }
    } else {
        SortState {
            column: Some(clicked),
            ascending: true,
        }
    }
}

/// Returns the sort indicator for a column header, or None if the column
/// is not the sort column. Uses arrow symbols included in the default
/// egui fonts.
#[must_use]
pub fn sort_indicator(sort: SortState, column: usize) -> Option<&'static str> {
    if sort.column == Some(column) {
        Some(if sort.ascending { "⬆" } else { "⬇" })
    } else {
        None
    }
}

/// Sortable value derived from one cell.
///
/// Rank order forces every numeric-looking value before every text value,
/// with rows whose sort cell is missing entirely pinned to the lowest rank
/// and placeholder cells to the highest.
#[derive(Clone, Debug, PartialEq)]
pub enum SortKey {
    /// Sort column absent from the row (index out of range)
    Lowest,
    Numeric(f64),
    Text(String),
    /// Cell stripped down to nothing (placeholder dash, empty text)
    Placeholder,
}

fn sort_key_rank(key: &SortKey) -> u8 {
    match key {
        SortKey::Lowest => 0,
        SortKey::Numeric(_) => 1,
        SortKey::Text(_) => 2,
        SortKey::Placeholder => 3,
    }
}

#[must_use]
pub fn compare_sort_keys(a: &SortKey, b: &SortKey) -> Ordering {
    let rank_a = sort_key_rank(a);
    let rank_b = sort_key_rank(b);
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (SortKey::Numeric(left), SortKey::Numeric(right)) => left.total_cmp(right),
        (SortKey::Text(left), SortKey::Text(right)) => left.cmp(right),
        _ => Ordering::Equal,
    }
}

/// Derives the sort key for one cell's display text: strip decorations,
/// try a numeric parse, fall back to lowercased text.
#[must_use]
pub fn sort_key_for(text: &str) -> SortKey {
    let stripped = strip_decorations(text);
    if stripped.is_empty() {
        return SortKey::Placeholder;
    }
    match stripped.parse::<f64>() {
        Ok(value) => SortKey::Numeric(value),
        Err(_) => SortKey::Text(stripped.to_lowercase()),
    }
}

/// Removes placeholder dashes, known unit suffixes and surrounding
/// whitespace. Units are stripped only at the end of the text so words that
/// merely contain a unit letter are left alone.
fn strip_decorations(text: &str) -> &str {
    let mut stripped = text.trim();
    loop {
        let before = stripped;
        for unit in UNIT_SUFFIXES {
            stripped = stripped.strip_suffix(unit).unwrap_or(stripped).trim_end();
        }
        stripped = stripped
            .strip_prefix(MISSING_PLACEHOLDER)
            .unwrap_or(stripped)
            .trim_start();
        stripped = stripped
            .strip_suffix(MISSING_PLACEHOLDER)
            .unwrap_or(stripped)
            .trim_end();
        if stripped == before {
            return stripped;
        }
    }
}
