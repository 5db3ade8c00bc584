use super::*;
use crate::config::ThemePalette;
use crate::message::GridMessage;
use crate::style::StyleRegistry;
use crate::theme::ThemeRegistry;
use std::sync::Arc;

fn columns() -> Vec<Column> {
    vec![
        Column::new("Name", 120.0),
        Column::new("Speed", 80.0),
        Column::new("Battery", 80.0),
    ]
}

fn sample_rows() -> Vec<Row> {
    vec![
        Row::new(vec!["alpha".into(), "85km/h".into(), "42%".into()]),
        Row::new(vec!["bravo".into(), "7km/h".into(), "90%".into()]),
        Row::new(vec!["charlie".into(), "—".into(), "15%".into()]),
        Row::new(vec!["delta".into(), "120km/h".into(), "3%".into()]),
    ]
}

fn registries() -> (Arc<ThemeRegistry>, Arc<StyleRegistry>) {
    let theme = ThemeRegistry::new(ThemePalette::default());
    let styles = StyleRegistry::new(theme.clone());
    (theme, styles)
}

fn grid() -> DataGrid {
    let (theme, styles) = registries();
    DataGrid::new(columns(), "test", None, 12, &theme, &styles)
}

fn projected_cells(engine: &ProjectionEngine, column: usize) -> Vec<String> {
    engine
        .projected_rows()
        .map(|row| row.cell_text(column))
        .collect()
}

// ========================
// Projection engine
// ========================

#[test]
fn empty_query_passes_every_row() {
    let mut engine = ProjectionEngine::new();
    engine.load(sample_rows());
    assert_eq!(engine.projected_len(), 4);
    assert_eq!(engine.projection(), &[0, 1, 2, 3]);
}

#[test]
fn filter_matches_substring_across_all_columns() {
    let mut engine = ProjectionEngine::new();
    engine.load(sample_rows());

    engine.set_filter("KM/H", FilterScope::All);
    assert_eq!(
        projected_cells(&engine, 0),
        vec!["alpha", "bravo", "delta"]
    );
}

#[test]
fn filter_scoped_to_one_column_ignores_the_rest() {
    let mut engine = ProjectionEngine::new();
    engine.load(sample_rows());

    // "85" appears in alpha's speed; scoping to Name must not match it
    engine.set_filter("85", FilterScope::Column(0));
    assert_eq!(engine.projected_len(), 0);

    engine.set_filter("85", FilterScope::Column(1));
    assert_eq!(projected_cells(&engine, 0), vec!["alpha"]);
}

#[test]
fn filter_is_non_destructive() {
    let mut engine = ProjectionEngine::new();
    engine.load(sample_rows());

    engine.set_filter("alpha", FilterScope::All);
    assert_eq!(engine.projected_len(), 1);

    engine.set_filter("", FilterScope::All);
    assert_eq!(engine.projection(), &[0, 1, 2, 3]);
    assert_eq!(
        projected_cells(&engine, 0),
        vec!["alpha", "bravo", "charlie", "delta"]
    );
}

#[test]
fn filter_persists_across_reload_until_cleared() {
    let mut engine = ProjectionEngine::new();
    engine.load(sample_rows());
    engine.set_filter("alpha", FilterScope::All);

    engine.load(sample_rows());
    assert!(engine.filter().is_active());
    assert_eq!(engine.projected_len(), 1);

    engine.clear_filters();
    assert_eq!(engine.projected_len(), 4);
    assert_eq!(engine.sort(), SortState::default());
}

#[test]
fn numeric_values_sort_before_text_and_placeholders_last() {
    let mut engine = ProjectionEngine::new();
    engine.load(vec![
        Row::new(vec!["10".into()]),
        Row::new(vec!["2".into()]),
        Row::new(vec!["abc".into()]),
        Row::new(vec!["—".into()]),
    ]);

    engine.set_sort(Some(0), true);
    assert_eq!(projected_cells(&engine, 0), vec!["2", "10", "abc", "—"]);

    engine.set_sort(Some(0), false);
    assert_eq!(projected_cells(&engine, 0), vec!["—", "abc", "10", "2"]);
}

#[test]
fn descending_reverses_the_whole_sequence_including_ties() {
    let mut engine = ProjectionEngine::new();
    engine.load(vec![
        Row::new(vec!["5".into(), "first".into()]),
        Row::new(vec!["5".into(), "second".into()]),
        Row::new(vec!["1".into(), "third".into()]),
    ]);

    engine.set_sort(Some(0), true);
    assert_eq!(projected_cells(&engine, 1), vec!["third", "first", "second"]);

    engine.set_sort(Some(0), false);
    assert_eq!(projected_cells(&engine, 1), vec!["second", "first", "third"]);
}

#[test]
fn unit_suffixes_strip_to_numeric_keys() {
    assert_eq!(sort_key_for("85km/h"), SortKey::Numeric(85.0));
    assert_eq!(sort_key_for("42%"), SortKey::Numeric(42.0));
    assert_eq!(sort_key_for("12.6V"), SortKey::Numeric(12.6));
    assert_eq!(sort_key_for("  7 km/h "), SortKey::Numeric(7.0));
}

#[test]
fn placeholder_and_text_keys() {
    assert_eq!(sort_key_for("—"), SortKey::Placeholder);
    assert_eq!(sort_key_for(""), SortKey::Placeholder);
    assert_eq!(sort_key_for("N/A"), SortKey::Text("n/a".to_string()));
    // A word ending in a unit letter is not a number
    assert_eq!(sort_key_for("12x5"), SortKey::Text("12x5".to_string()));
}

#[test]
fn unit_letters_inside_words_are_left_alone() {
    assert_eq!(
        sort_key_for("Very fast"),
        SortKey::Text("very fast".to_string())
    );
}

#[test]
fn sorting_by_units_orders_numerically() {
    let mut engine = ProjectionEngine::new();
    engine.load(sample_rows());

    engine.set_sort(Some(1), true);
    assert_eq!(
        projected_cells(&engine, 0),
        vec!["bravo", "alpha", "delta", "charlie"]
    );
}

#[test]
fn missing_sort_cells_take_the_lowest_rank() {
    let mut engine = ProjectionEngine::new();
    engine.load(vec![
        Row::new(vec!["full".into(), "10".into()]),
        Row::new(vec!["short".into()]),
        Row::new(vec!["other".into(), "2".into()]),
    ]);

    engine.set_sort(Some(1), true);
    assert_eq!(projected_cells(&engine, 0), vec!["short", "other", "full"]);

    engine.set_sort(Some(1), false);
    assert_eq!(projected_cells(&engine, 0), vec!["full", "other", "short"]);
}

#[test]
fn sort_applies_to_filtered_rows_only() {
    let mut engine = ProjectionEngine::new();
    engine.load(sample_rows());

    engine.set_filter("km/h", FilterScope::All);
    engine.set_sort(Some(1), false);
    assert_eq!(projected_cells(&engine, 0), vec!["delta", "alpha", "bravo"]);
}

#[test]
fn header_click_cycles_column_then_direction() {
    let initial = SortState::default();
    let first = sort_on_header_click(initial, 1);
    assert_eq!(
        first,
        SortState {
            column: Some(1),
            ascending: true
        }
    );

    let second = sort_on_header_click(first, 1);
    assert!(!second.ascending);

    let third = sort_on_header_click(second, 2);
    assert_eq!(
        third,
        SortState {
            column: Some(2),
            ascending: true
        }
    );
}

#[test]
fn scope_for_unknown_label_widens_to_all_columns() {
    let columns = columns();
    assert_eq!(scope_for_label(&columns, "Speed"), FilterScope::Column(1));
    assert_eq!(scope_for_label(&columns, "Nope"), FilterScope::All);
}

// ========================
// Row loading and tags
// ========================

#[test]
fn load_accepts_bare_rows_and_tagged_rows() {
    let mut grid = grid();
    grid.load(vec![
        Row::from(vec!["bare".into()]),
        Row::from((vec!["one-tag".into()], "warn")),
        Row::from((
            vec!["many-tags".into()],
            vec!["warn".to_string(), "danger".to_string(), "warn".to_string()],
        )),
    ]);

    let engine = grid.engine();
    assert!(engine.projected_row(0).unwrap().tags.is_empty());
    assert_eq!(
        engine
            .projected_row(1)
            .unwrap()
            .tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>(),
        vec!["warn"]
    );
    // Duplicate tags collapse into the set
    assert_eq!(engine.projected_row(2).unwrap().tags.len(), 2);
}

#[test]
fn tag_style_lookup_uses_row_tags() {
    let mut grid = grid();
    let warn = TagStyle {
        background: Some(ecolor::Color32::from_rgb(80, 60, 0)),
        foreground: None,
    };
    grid.tag_style("warn", warn);
    grid.load(vec![
        Row::tagged(vec!["tagged".into()], ["warn"]),
        Row::new(vec!["plain".into()]),
    ]);

    assert_eq!(
        grid.tag_style_for(grid.engine().projected_row(0).unwrap()),
        Some(warn)
    );
    assert_eq!(
        grid.tag_style_for(grid.engine().projected_row(1).unwrap()),
        None
    );
}

// ========================
// Selection
// ========================

#[test]
fn reload_keeps_filter_but_discards_selection() {
    let mut grid = grid();
    grid.load(sample_rows());
    grid.set_filter("km/h", FilterScope::All);
    grid.update(GridMessage::RowClicked {
        display_index: 0,
        ctrl: false,
        shift: false,
    });
    assert_eq!(grid.selection_len(), 1);

    grid.load(sample_rows());
    assert_eq!(grid.selection_len(), 0);
    assert!(grid.engine().filter().is_active());
}

#[test]
fn selection_follows_display_order() {
    let mut grid = grid();
    grid.load(sample_rows());
    grid.set_sort(Some(1), true);

    // Select the two fastest rows (displayed last before the placeholder)
    grid.update(GridMessage::RowClicked {
        display_index: 1,
        ctrl: false,
        shift: false,
    });
    grid.update(GridMessage::RowClicked {
        display_index: 2,
        ctrl: true,
        shift: false,
    });

    let selected: Vec<String> = grid
        .get_selection()
        .iter()
        .map(|row| row.cell_text(0))
        .collect();
    assert_eq!(selected, vec!["alpha", "delta"]);
}

#[test]
fn shift_click_selects_a_display_range() {
    let mut grid = grid();
    grid.load(sample_rows());

    grid.update(GridMessage::RowClicked {
        display_index: 1,
        ctrl: false,
        shift: false,
    });
    grid.update(GridMessage::RowClicked {
        display_index: 3,
        ctrl: false,
        shift: true,
    });

    let selected: Vec<String> = grid
        .get_selection()
        .iter()
        .map(|row| row.cell_text(0))
        .collect();
    assert_eq!(selected, vec!["bravo", "charlie", "delta"]);
}

#[test]
fn select_all_covers_the_projection_only() {
    let mut grid = grid();
    grid.load(sample_rows());
    grid.set_filter("km/h", FilterScope::All);
    grid.update(GridMessage::SelectAll);
    assert_eq!(grid.selection_len(), 3);

    grid.update(GridMessage::ClearSelection);
    assert_eq!(grid.selection_len(), 0);
}

// ========================
// Clipboard
// ========================

#[test]
fn copy_selection_is_tab_separated_in_display_order() {
    let mut grid = grid();
    grid.load(sample_rows());
    grid.update(GridMessage::RowClicked {
        display_index: 0,
        ctrl: false,
        shift: false,
    });
    grid.update(GridMessage::RowClicked {
        display_index: 2,
        ctrl: true,
        shift: false,
    });

    let payload = grid.resolve_copy(&GridMessage::CopySelection).unwrap();
    assert_eq!(payload, "alpha\t85km/h\t42%\ncharlie\t—\t15%");
}

#[test]
fn copy_selection_with_nothing_selected_is_a_no_op() {
    let mut grid = grid();
    grid.load(sample_rows());
    assert_eq!(grid.resolve_copy(&GridMessage::CopySelection), None);
}

#[test]
fn copy_all_is_semicolon_separated_with_header() {
    let mut grid = grid();
    grid.load(vec![
        Row::new(vec!["a".into(), "1".into(), "2".into()]),
        Row::new(vec!["b".into(), "3".into(), "4".into()]),
    ]);

    let payload = grid.resolve_copy(&GridMessage::CopyAll).unwrap();
    assert_eq!(payload, "Name;Speed;Battery\na;1;2\nb;3;4");
}

#[test]
fn copy_cell_resolves_against_the_projection() {
    let mut grid = grid();
    grid.load(sample_rows());
    grid.set_sort(Some(1), true);

    let payload = grid
        .resolve_copy(&GridMessage::CopyCell {
            display_index: 0,
            column: 1,
        })
        .unwrap();
    assert_eq!(payload, "7km/h");
}

#[test]
fn copy_cell_with_stale_coordinates_falls_back() {
    let mut grid = grid();
    grid.load(sample_rows());
    grid.update(GridMessage::RowClicked {
        display_index: 0,
        ctrl: false,
        shift: false,
    });

    // Stale column: the whole row is copied instead
    let payload = grid
        .resolve_copy(&GridMessage::CopyCell {
            display_index: 0,
            column: 99,
        })
        .unwrap();
    assert_eq!(payload, "alpha\t85km/h\t42%");

    // Stale row: fall back to the selection
    let payload = grid
        .resolve_copy(&GridMessage::CopyCell {
            display_index: 99,
            column: 0,
        })
        .unwrap();
    assert_eq!(payload, "alpha\t85km/h\t42%");
}

#[test]
fn clipboard_payloads_escape_embedded_tabs_and_newlines() {
    let rows = vec![Row::new(vec!["two\nlines".into(), "a\tb".into()])];
    let refs: Vec<&Row> = rows.iter().collect();
    assert_eq!(format_rows_as_tsv(&refs), "two lines\ta b");
}

// ========================
// CSV export
// ========================

#[test]
fn export_round_trips_through_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.csv");
    let columns = vec![Column::new("A", 10.0), Column::new("B", 10.0)];
    let rows = vec![
        Row::new(vec!["1".into(), "2".into()]),
        Row::new(vec!["3".into(), "4".into()]),
    ];
    let refs: Vec<&Row> = rows.iter().collect();

    let status = export_csv(&columns, &refs, &destination).unwrap();
    assert_eq!(status, ExportStatus::Written(destination.clone()));

    let content = std::fs::read_to_string(&destination).unwrap();
    let body = content
        .strip_prefix('\u{feff}')
        .expect("file starts with a UTF-8 BOM");
    let parsed: Vec<Vec<&str>> = body
        .lines()
        .map(|line| line.split(CSV_DELIMITER).collect())
        .collect();
    assert_eq!(
        parsed,
        vec![vec!["A", "B"], vec!["1", "2"], vec!["3", "4"]]
    );
}

#[test]
fn export_with_zero_rows_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.csv");
    let columns = vec![Column::new("A", 10.0)];

    let status = export_csv(&columns, &[], &destination).unwrap();
    assert_eq!(status, ExportStatus::NothingToExport);
    assert!(!destination.exists());
}

#[test]
fn export_failure_reports_the_underlying_cause() {
    let columns = vec![Column::new("A", 10.0)];
    let rows = vec![Row::new(vec!["1".into()])];
    let refs: Vec<&Row> = rows.iter().collect();

    let destination = std::path::Path::new("/nonexistent-dir/out.csv");
    let err = export_csv(&columns, &refs, destination).unwrap_err();
    assert!(err.to_string().contains("Failed to write"));
}

#[test]
fn export_feedback_is_reported_and_dismissable() {
    let dir = tempfile::tempdir().unwrap();
    let mut grid = grid();

    grid.update(GridMessage::ExportCsv(dir.path().join("empty.csv")));
    assert_eq!(
        grid.export_feedback(),
        Some(&ExportFeedback::NothingToExport)
    );

    grid.load(sample_rows());
    let destination = dir.path().join("fleet.csv");
    grid.update(GridMessage::ExportCsv(destination.clone()));
    assert_eq!(
        grid.export_feedback(),
        Some(&ExportFeedback::Saved(destination))
    );

    grid.update(GridMessage::DismissExportFeedback);
    assert_eq!(grid.export_feedback(), None);
}

#[test]
fn default_export_filename_is_timestamped() {
    let name = default_export_filename("fleet");
    assert!(name.starts_with("fleet_"));
    assert!(name.ends_with(".csv"));
    // fleet_YYYYMMDD_HHMMSS.csv
    assert_eq!(name.len(), "fleet_".len() + 15 + ".csv".len());
}

// ========================
// Theme reactions
// ========================

#[test]
fn context_menu_is_rebuilt_on_every_theme_change() {
    let (theme, styles) = registries();
    let grid = DataGrid::new(columns(), "menus", None, 12, &theme, &styles);

    let menu = grid.menu();
    assert_eq!(menu.lock().unwrap().generation(), 0);
    let dark_background = menu.lock().unwrap().background;

    theme.set_palette(ThemePalette::new(Some("light".to_string())).unwrap());
    theme.set_palette(ThemePalette::new(Some("light".to_string())).unwrap());

    let menu = menu.lock().unwrap();
    assert_eq!(menu.generation(), 2);
    assert_ne!(menu.background, dark_background);
    assert_eq!(menu.background, theme.palette().surface_raised);
}

#[test]
fn grid_style_tracks_the_final_palette() {
    let (theme, styles) = registries();
    let grid = DataGrid::new(
        columns(),
        "tracked",
        Some(theme.palette().danger),
        12,
        &theme,
        &styles,
    );

    for name in ["light", "high-contrast", "dark", "light"] {
        theme.set_palette(ThemePalette::new(Some(name.to_string())).unwrap());
    }

    let style = grid.style();
    let palette = theme.palette();
    assert_eq!(style.header_foreground, palette.danger);
    assert_eq!(style.background, palette.surface_alt);
    assert_eq!(style.selection_background, palette.accent_alt);
}

// ========================
// Export request handshake
// ========================

#[test]
fn export_request_is_consumed_once() {
    let mut grid = grid();
    grid.update(GridMessage::ExportRequested);
    assert!(grid.take_export_request());
    assert!(!grid.take_export_request());
}
