pub mod clipboard;
pub mod grid;
pub mod menu;
pub mod model;
pub mod projection;
pub mod view;

pub use clipboard::{
    CSV_DELIMITER, ExportStatus, default_export_filename, export_csv, format_rows_as_tsv,
    format_rows_with_header,
};
pub use grid::{DataGrid, ExportFeedback, TagStyle};
pub use menu::{ContextMenu, MenuAction, MenuEntry};
pub use model::{
    CellValue, Column, FilterScope, FilterState, MISSING_PLACEHOLDER, Row, SortKey, SortState,
    UNIT_SUFFIXES, compare_sort_keys, scope_for_label, sort_indicator, sort_key_for,
    sort_on_header_click,
};
pub use projection::ProjectionEngine;
pub use view::draw_data_grid;

#[cfg(test)]
mod tests;
