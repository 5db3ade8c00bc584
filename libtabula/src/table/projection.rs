//! Authoritative dataset and display projection for one grid instance.
//!
//! The engine owns the loaded rows and recomputes the filtered, sorted
//! projection in full on every change to its inputs. The projection is a
//! pure function of (rows, filter, sort) and is never mutated directly.

use itertools::Itertools;

use super::model::{
    FilterScope, FilterState, Row, SortKey, SortState, compare_sort_keys, sort_key_for,
};

#[derive(Debug, Default)]
pub struct ProjectionEngine {
    rows: Vec<Row>,
    filter: FilterState,
    sort: SortState,
    /// Indices into `rows`, in display order
    projection: Vec<usize>,
}

impl ProjectionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the authoritative dataset wholesale. Filter and sort state
    /// persist across reloads; only `clear_filters` resets them.
    pub fn load(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.recompute();
    }

    /// Drops every row.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.recompute();
    }

    pub fn set_filter(&mut self, query: impl Into<String>, scope: FilterScope) {
        self.filter = FilterState {
            query: query.into(),
            scope,
        };
        self.recompute();
    }

    pub fn set_sort(&mut self, column: Option<usize>, ascending: bool) {
        self.sort = SortState { column, ascending };
        self.recompute();
    }

    pub fn toggle_sort_direction(&mut self) {
        self.sort.ascending = !self.sort.ascending;
        self.recompute();
    }

    /// Resets filter and sort to their defaults. The only way to clear
    /// them; reloading the dataset does not.
    pub fn clear_filters(&mut self) {
        self.filter = FilterState::default();
        self.sort = SortState::default();
        self.recompute();
    }

    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    #[must_use]
    pub fn sort(&self) -> SortState {
        self.sort
    }

    /// Total number of authoritative rows, ignoring the filter.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Display-ordered indices into the authoritative dataset.
    #[must_use]
    pub fn projection(&self) -> &[usize] {
        &self.projection
    }

    #[must_use]
    pub fn projected_len(&self) -> usize {
        self.projection.len()
    }

    /// Row shown at `display_index`, if in range.
    #[must_use]
    pub fn projected_row(&self, display_index: usize) -> Option<&Row> {
        self.projection
            .get(display_index)
            .and_then(|&index| self.rows.get(index))
    }

    pub fn projected_rows(&self) -> impl Iterator<Item = &Row> {
        self.projection.iter().map(|&index| &self.rows[index])
    }

    /// Authoritative index of the row shown at `display_index`.
    #[must_use]
    pub fn base_index(&self, display_index: usize) -> Option<usize> {
        self.projection.get(display_index).copied()
    }

    fn recompute(&mut self) {
        let query = self.filter.query.trim().to_lowercase();

        let mut projection: Vec<usize> = if query.is_empty() {
            (0..self.rows.len()).collect()
        } else {
            self.rows
                .iter()
                .enumerate()
                .filter(|(_, row)| haystack_for(row, self.filter.scope).contains(&query))
                .map(|(index, _)| index)
                .collect()
        };

        if let Some(column) = self.sort.column {
            let mut keyed: Vec<(SortKey, usize)> = projection
                .into_iter()
                .map(|index| (self.sort_key(index, column), index))
                .collect();
            // Stable ascending order; ties keep filter-pass order via the
            // base index. Descending reverses the entire sequence.
            keyed.sort_by(|(key_a, index_a), (key_b, index_b)| {
                compare_sort_keys(key_a, key_b).then(index_a.cmp(index_b))
            });
            projection = keyed.into_iter().map(|(_, index)| index).collect();
            if !self.sort.ascending {
                projection.reverse();
            }
        }

        self.projection = projection;
    }

    fn sort_key(&self, row_index: usize, column: usize) -> SortKey {
        match self.rows[row_index].cell(column) {
            Some(cell) => sort_key_for(&cell.display()),
            None => SortKey::Lowest,
        }
    }
}

/// Lowercased text the query is matched against for one row.
fn haystack_for(row: &Row, scope: FilterScope) -> String {
    match scope {
        FilterScope::All => row
            .values
            .iter()
            .map(|value| value.display().to_lowercase())
            .join(" "),
        FilterScope::Column(index) => row.cell_text(index).to_lowercase(),
    }
}
