//! Tabula: a reusable, themed, filterable data grid for egui applications.
//!
//! The crate is built around three pieces:
//!
//! - [`theme::ThemeRegistry`] holds the one live [`config::ThemePalette`]
//!   and broadcasts palette swaps to registered listeners.
//! - [`style::StyleRegistry`] maps style names to palette-derived rendering
//!   parameters and re-derives every binding on each broadcast, so grids
//!   created at any point stay consistent without being rebuilt.
//! - [`table::DataGrid`] owns the authoritative rows of one grid, the
//!   filtered and sorted projection actually shown, selection, tag styling
//!   and clipboard/CSV export.
//!
//! A hosting application wires these together roughly like this:
//!
//! ```no_run
//! use libtabula::config::ThemePalette;
//! use libtabula::style::StyleRegistry;
//! use libtabula::table::{Column, DataGrid, Row, draw_data_grid};
//! use libtabula::theme::ThemeRegistry;
//!
//! let theme = ThemeRegistry::new(ThemePalette::default());
//! let styles = StyleRegistry::new(theme.clone());
//!
//! let mut grid = DataGrid::new(
//!     vec![Column::new("Vehicle", 120.0), Column::new("Speed", 80.0)],
//!     "fleet",
//!     None,
//!     12,
//!     &theme,
//!     &styles,
//! );
//! grid.load(vec![
//!     Row::new(vec!["BR-042".into(), "85km/h".into()]),
//!     Row::new(vec!["BR-117".into(), "—".into()]),
//! ]);
//! # let _ = |ui: &mut egui::Ui| draw_data_grid(&mut grid, ui);
//! ```

pub mod config;
pub mod message;
pub mod style;
pub mod table;
pub mod theme;

pub use config::{ColorRole, ThemePalette};
pub use message::GridMessage;
pub use style::{ColorRef, GridStyle, StyleRegistry};
pub use table::{CellValue, Column, DataGrid, Row, draw_data_grid};
pub use theme::ThemeRegistry;
