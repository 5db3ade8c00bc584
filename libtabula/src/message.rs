use std::path::PathBuf;

use crate::table::model::FilterScope;

/// User interactions emitted by the grid view and applied by
/// [`DataGrid::update`](crate::table::DataGrid::update).
#[derive(Debug, Clone, PartialEq)]
pub enum GridMessage {
    SetFilterQuery(String),
    SetFilterScope(FilterScope),
    SetSort {
        column: Option<usize>,
        ascending: bool,
    },
    HeaderClicked(usize),
    ToggleSortDirection,
    ClearFilters,
    RowClicked {
        display_index: usize,
        ctrl: bool,
        shift: bool,
    },
    SelectAll,
    ClearSelection,
    /// Remembers which cell the context menu was opened on. The stored
    /// coordinates go stale if the projection changes before a menu action
    /// fires, which is acceptable.
    ContextMenuOpened {
        display_index: usize,
        column: usize,
    },
    CopySelection,
    CopyCell {
        display_index: usize,
        column: usize,
    },
    CopyAll,
    /// Asks the hosting application to pick a destination and reply with
    /// [`GridMessage::ExportCsv`]. File choosers live outside the grid.
    ExportRequested,
    ExportCsv(PathBuf),
    DismissExportFeedback,
}
