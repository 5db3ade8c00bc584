//! The grid instance: authoritative dataset, selection, tag styling,
//! clipboard/export actions and the rebuilt-on-theme-change context menu.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use ecolor::Color32;
use log::{error, info};

use crate::message::GridMessage;
use crate::style::{GridStyle, StyleRegistry};
use crate::table::clipboard::{self, ExportStatus};
use crate::table::menu::ContextMenu;
use crate::table::model::{Column, FilterScope, Row, SortState, sort_on_header_click};
use crate::table::projection::ProjectionEngine;
use crate::theme::ThemeRegistry;

/// Visual override applied to rows carrying a tag.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TagStyle {
    pub background: Option<Color32>,
    pub foreground: Option<Color32>,
}

/// User-facing outcome of the most recent export, shown until dismissed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportFeedback {
    Saved(std::path::PathBuf),
    NothingToExport,
    Failed(String),
}

impl fmt::Display for ExportFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(path) => write!(f, "File saved:\n{}", path.display()),
            Self::NothingToExport => f.write_str("Nothing to export."),
            Self::Failed(reason) => write!(f, "Failed to save:\n{reason}"),
        }
    }
}

pub struct DataGrid {
    columns: Vec<Column>,
    style_name: String,
    visible_rows: usize,
    engine: ProjectionEngine,
    /// Base indices of selected rows; positional, so replacing the dataset
    /// discards the selection
    selection: BTreeSet<usize>,
    selection_anchor: Option<usize>,
    tag_styles: HashMap<String, TagStyle>,
    menu: Arc<Mutex<ContextMenu>>,
    /// Cell the context menu was last opened on (display index, column)
    menu_cell: Option<(usize, usize)>,
    styles: Arc<StyleRegistry>,
    context: Option<egui::Context>,
    export_prefix: String,
    export_feedback: Option<ExportFeedback>,
    export_requested: bool,
}

impl DataGrid {
    /// Creates a grid with a fixed column set, registers its style binding
    /// and hooks the context menu up to the theme broadcast.
    #[must_use]
    pub fn new(
        columns: Vec<Column>,
        style_name: impl Into<String>,
        header_color: Option<Color32>,
        visible_rows: usize,
        theme: &Arc<ThemeRegistry>,
        styles: &Arc<StyleRegistry>,
    ) -> Self {
        let style_name = style_name.into();
        styles.apply_style(&style_name, header_color);

        let menu = Arc::new(Mutex::new(ContextMenu::build(&theme.palette())));
        theme.register_listener({
            let menu = Arc::downgrade(&menu);
            let theme = Arc::downgrade(theme);
            move || {
                if let (Some(menu), Some(theme)) = (menu.upgrade(), theme.upgrade()) {
                    menu.lock()
                        .expect("Failed to lock context menu. Thread poisoned?")
                        .rebuild(&theme.palette());
                }
            }
        });

        Self {
            columns,
            style_name,
            visible_rows,
            engine: ProjectionEngine::new(),
            selection: BTreeSet::new(),
            selection_anchor: None,
            tag_styles: HashMap::new(),
            menu,
            menu_cell: None,
            styles: styles.clone(),
            context: None,
            export_prefix: "tabula".to_string(),
            export_feedback: None,
            export_requested: false,
        }
    }

    #[must_use]
    pub fn with_export_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.export_prefix = prefix.into();
        self
    }

    /// Replaces the dataset wholesale. Filter and sort persist; the
    /// positional selection is discarded.
    pub fn load<R: Into<Row>>(&mut self, rows: impl IntoIterator<Item = R>) {
        self.engine
            .load(rows.into_iter().map(Into::into).collect());
        self.selection.clear();
        self.selection_anchor = None;
    }

    /// Drops every row and the selection.
    pub fn clear(&mut self) {
        self.engine.clear();
        self.selection.clear();
        self.selection_anchor = None;
    }

    /// Registers a visual override for rows carrying `tag`.
    pub fn tag_style(&mut self, tag: impl Into<String>, style: TagStyle) {
        self.tag_styles.insert(tag.into(), style);
    }

    /// First matching tag override for a row, in tag order.
    #[must_use]
    pub fn tag_style_for(&self, row: &Row) -> Option<TagStyle> {
        row.tags
            .iter()
            .find_map(|tag| self.tag_styles.get(tag))
            .copied()
    }

    /// Selected rows, cloned, in current display order.
    #[must_use]
    pub fn get_selection(&self) -> Vec<Row> {
        self.selected_display_rows()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn set_filter(&mut self, query: impl Into<String>, scope: FilterScope) {
        self.engine.set_filter(query, scope);
    }

    pub fn set_sort(&mut self, column: Option<usize>, ascending: bool) {
        self.engine.set_sort(column, ascending);
    }

    pub fn clear_filters(&mut self) {
        self.engine.clear_filters();
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    #[must_use]
    pub fn engine(&self) -> &ProjectionEngine {
        &self.engine
    }

    #[must_use]
    pub fn style_name(&self) -> &str {
        &self.style_name
    }

    /// Currently resolved style; re-registers the binding if the name was
    /// never applied.
    #[must_use]
    pub fn style(&self) -> GridStyle {
        self.styles
            .style(&self.style_name)
            .unwrap_or_else(|| self.styles.apply_style(&self.style_name, None))
    }

    #[must_use]
    pub fn menu(&self) -> Arc<Mutex<ContextMenu>> {
        self.menu.clone()
    }

    #[must_use]
    pub fn menu_cell(&self) -> Option<(usize, usize)> {
        self.menu_cell
    }

    #[must_use]
    pub fn export_feedback(&self) -> Option<&ExportFeedback> {
        self.export_feedback.as_ref()
    }

    #[must_use]
    pub fn default_export_filename(&self) -> String {
        clipboard::default_export_filename(&self.export_prefix)
    }

    #[must_use]
    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    /// True once per export request coming from the grid's own UI; the host
    /// answers by sending [`GridMessage::ExportCsv`] with a destination.
    pub fn take_export_request(&mut self) -> bool {
        std::mem::take(&mut self.export_requested)
    }

    #[must_use]
    pub fn is_selected_display(&self, display_index: usize) -> bool {
        self.engine
            .base_index(display_index)
            .is_some_and(|base| self.selection.contains(&base))
    }

    pub(crate) fn attach_context(&mut self, context: egui::Context) {
        self.context = Some(context);
    }

    #[must_use]
    pub(crate) fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Applies one view-emitted action.
    pub fn update(&mut self, message: GridMessage) {
        match message {
            GridMessage::SetFilterQuery(query) => {
                let scope = self.engine.filter().scope;
                self.engine.set_filter(query, scope);
            }
            GridMessage::SetFilterScope(scope) => {
                let query = self.engine.filter().query.clone();
                self.engine.set_filter(query, scope);
            }
            GridMessage::SetSort { column, ascending } => {
                self.engine.set_sort(column, ascending);
            }
            GridMessage::HeaderClicked(clicked) => {
                let SortState { column, ascending } =
                    sort_on_header_click(self.engine.sort(), clicked);
                self.engine.set_sort(column, ascending);
            }
            GridMessage::ToggleSortDirection => self.engine.toggle_sort_direction(),
            GridMessage::ClearFilters => self.engine.clear_filters(),
            GridMessage::RowClicked {
                display_index,
                ctrl,
                shift,
            } => self.handle_row_click(display_index, ctrl, shift),
            GridMessage::SelectAll => {
                self.selection = self.engine.projection().iter().copied().collect();
                self.selection_anchor = self.engine.base_index(0);
            }
            GridMessage::ClearSelection => {
                self.selection.clear();
                self.selection_anchor = None;
            }
            GridMessage::ContextMenuOpened {
                display_index,
                column,
            } => {
                self.menu_cell = Some((display_index, column));
                if let Some(base) = self.engine.base_index(display_index)
                    && !self.selection.contains(&base)
                {
                    self.selection = BTreeSet::from([base]);
                    self.selection_anchor = Some(base);
                }
            }
            GridMessage::CopySelection
            | GridMessage::CopyCell { .. }
            | GridMessage::CopyAll => {
                if let Some(payload) = self.resolve_copy(&message) {
                    self.copy_to_clipboard(payload);
                }
            }
            GridMessage::ExportRequested => self.export_requested = true,
            GridMessage::ExportCsv(destination) => {
                let rows: Vec<&Row> = self.engine.projected_rows().collect();
                self.export_feedback =
                    Some(match clipboard::export_csv(&self.columns, &rows, &destination) {
                        Ok(ExportStatus::Written(path)) => {
                            info!("Exported {} rows to {}", rows.len(), path.display());
                            ExportFeedback::Saved(path)
                        }
                        Ok(ExportStatus::NothingToExport) => {
                            info!("Nothing to export");
                            ExportFeedback::NothingToExport
                        }
                        Err(e) => {
                            error!("CSV export failed: {e:#}");
                            ExportFeedback::Failed(format!("{e:#}"))
                        }
                    });
            }
            GridMessage::DismissExportFeedback => self.export_feedback = None,
        }
    }

    fn handle_row_click(&mut self, display_index: usize, ctrl: bool, shift: bool) {
        let Some(base) = self.engine.base_index(display_index) else {
            return;
        };

        if ctrl {
            if !self.selection.remove(&base) {
                self.selection.insert(base);
            }
            self.selection_anchor = Some(base);
        } else if shift {
            let anchor_display = self
                .selection_anchor
                .and_then(|anchor| {
                    self.engine
                        .projection()
                        .iter()
                        .position(|&index| index == anchor)
                })
                .unwrap_or(display_index);
            let (from, to) = if anchor_display <= display_index {
                (anchor_display, display_index)
            } else {
                (display_index, anchor_display)
            };
            self.selection = self.engine.projection()[from..=to].iter().copied().collect();
        } else {
            self.selection = BTreeSet::from([base]);
            self.selection_anchor = Some(base);
        }
    }

    /// The clipboard payload a copy action would produce, if any.
    pub(crate) fn resolve_copy(&self, message: &GridMessage) -> Option<String> {
        match message {
            GridMessage::CopySelection => {
                let rows = self.selected_display_rows();
                if rows.is_empty() {
                    None
                } else {
                    Some(clipboard::format_rows_as_tsv(&rows))
                }
            }
            GridMessage::CopyCell {
                display_index,
                column,
            } => match self.engine.projected_row(*display_index) {
                Some(row) => match row.cell(*column) {
                    Some(cell) => Some(cell.display()),
                    // Stale column: fall back to copying the whole row
                    None => Some(clipboard::format_rows_as_tsv(&[row])),
                },
                // Stale row: fall back to the selection
                None => self.resolve_copy(&GridMessage::CopySelection),
            },
            GridMessage::CopyAll => {
                let rows: Vec<&Row> = self.engine.projected_rows().collect();
                Some(clipboard::format_rows_with_header(&self.columns, &rows))
            }
            _ => None,
        }
    }

    fn selected_display_rows(&self) -> Vec<&Row> {
        self.engine
            .projection()
            .iter()
            .enumerate()
            .filter(|&(_, base)| self.selection.contains(base))
            .filter_map(|(display, _)| self.engine.projected_row(display))
            .collect()
    }

    fn copy_to_clipboard(&self, payload: String) {
        if let Some(context) = &self.context {
            context.copy_text(payload);
        }
    }
}
