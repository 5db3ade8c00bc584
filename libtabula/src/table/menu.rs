//! Context menu model for grid rows.
//!
//! Unlike styles, the menu is not recolored in place: its entries and
//! colors are captured at build time, and the whole model is discarded and
//! rebuilt whenever the theme changes.

use ecolor::Color32;

use crate::config::ThemePalette;

/// Action bound to a context-menu entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    CopyRow,
    CopyCell,
    CopyAll,
    ExportCsv,
    ClearFilters,
}

#[derive(Clone, Debug)]
pub struct MenuEntry {
    pub action: MenuAction,
    pub label: &'static str,
    pub separator_before: bool,
}

#[derive(Debug)]
pub struct ContextMenu {
    pub entries: Vec<MenuEntry>,
    pub background: Color32,
    pub foreground: Color32,
    pub hover_background: Color32,
    generation: u64,
}

impl ContextMenu {
    /// Builds a fresh menu against the given palette.
    #[must_use]
    pub fn build(palette: &ThemePalette) -> Self {
        Self {
            entries: vec![
                MenuEntry {
                    action: MenuAction::CopyRow,
                    label: "Copy row",
                    separator_before: false,
                },
                MenuEntry {
                    action: MenuAction::CopyCell,
                    label: "Copy cell",
                    separator_before: false,
                },
                MenuEntry {
                    action: MenuAction::CopyAll,
                    label: "Copy all (CSV)",
                    separator_before: false,
                },
                MenuEntry {
                    action: MenuAction::ExportCsv,
                    label: "Export CSV…",
                    separator_before: true,
                },
                MenuEntry {
                    action: MenuAction::ClearFilters,
                    label: "Clear filters",
                    separator_before: true,
                },
            ],
            background: palette.surface_raised,
            foreground: palette.text,
            hover_background: palette.accent_alt,
            generation: 0,
        }
    }

    /// Throws the current build away and replaces it with one derived from
    /// the new palette.
    pub fn rebuild(&mut self, palette: &ThemePalette) {
        let generation = self.generation + 1;
        *self = Self::build(palette);
        self.generation = generation;
    }

    /// How many times this menu has been rebuilt.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
