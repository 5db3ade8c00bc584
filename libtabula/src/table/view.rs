//! egui rendering for [`DataGrid`].
//!
//! The view is stateless: it reads the grid, emits [`GridMessage`]s for
//! every interaction, and applies them after rendering. The whole
//! projection is re-rendered every frame.

use egui::{Align, Align2, Frame, Key, Layout, Margin, RichText, Sense};
use egui_extras::TableBuilder;

use crate::message::GridMessage;
use crate::style::GridStyle;
use crate::table::grid::DataGrid;
use crate::table::menu::MenuAction;
use crate::table::model::{Column, FilterScope, sort_indicator};

/// Renders the filter bar, the grid body and any pending export feedback,
/// then applies the interactions gathered during rendering.
pub fn draw_data_grid(grid: &mut DataGrid, ui: &mut egui::Ui) {
    if !grid.has_context() {
        grid.attach_context(ui.ctx().clone());
    }

    let style = grid.style();
    let mut msgs: Vec<GridMessage> = Vec::new();

    draw_filter_bar(grid, ui, style, &mut msgs);
    draw_table(grid, ui, style, &mut msgs);
    draw_export_feedback(grid, ui, &mut msgs);

    if ui.ui_contains_pointer()
        && ui
            .ctx()
            .input(|i| i.modifiers.command && i.key_pressed(Key::C))
    {
        msgs.push(GridMessage::CopySelection);
    }

    for message in msgs {
        grid.update(message);
    }
}

fn draw_filter_bar(
    grid: &DataGrid,
    ui: &mut egui::Ui,
    style: GridStyle,
    msgs: &mut Vec<GridMessage>,
) {
    let filter = grid.engine().filter().clone();
    let sort = grid.engine().sort();
    let columns = grid.columns();

    Frame {
        fill: style.header_background,
        inner_margin: Margin {
            left: 6,
            right: 6,
            top: 3,
            bottom: 3,
        },
        ..Default::default()
    }
    .show(ui, |ui| {
        ui.horizontal(|ui| {
            if filter.is_active() {
                ui.label(
                    RichText::new("Filter:")
                        .strong()
                        .color(style.header_foreground),
                );
            } else {
                ui.label(RichText::new("Filter:").color(style.foreground));
            }

            let mut query = filter.query.clone();
            let response = ui.add(
                egui::TextEdit::singleline(&mut query)
                    .hint_text("Search…")
                    .desired_width(150.0),
            );
            if response.changed() {
                msgs.push(GridMessage::SetFilterQuery(query.clone()));
            }

            ui.label(RichText::new("Column:").color(style.foreground));
            let scope_label = match filter.scope {
                FilterScope::All => "All columns".to_string(),
                FilterScope::Column(index) => columns
                    .get(index)
                    .map_or_else(|| "All columns".to_string(), |c| c.label.clone()),
            };
            let mut new_scope = filter.scope;
            egui::ComboBox::from_id_salt(ui.id().with("filter_scope"))
                .selected_text(scope_label)
                .width(110.0)
                .show_ui(ui, |ui| {
                    if ui
                        .selectable_value(&mut new_scope, FilterScope::All, "All columns")
                        .changed()
                    {
                        msgs.push(GridMessage::SetFilterScope(new_scope));
                    }
                    for (index, column) in columns.iter().enumerate() {
                        if ui
                            .selectable_value(
                                &mut new_scope,
                                FilterScope::Column(index),
                                &column.label,
                            )
                            .changed()
                        {
                            msgs.push(GridMessage::SetFilterScope(new_scope));
                        }
                    }
                });

            ui.label(RichText::new("Sort:").color(style.foreground));
            let sort_label = sort
                .column
                .and_then(|index| columns.get(index))
                .map_or_else(|| "—".to_string(), |c| c.label.clone());
            let mut new_sort = sort.column;
            egui::ComboBox::from_id_salt(ui.id().with("sort_column"))
                .selected_text(sort_label)
                .width(110.0)
                .show_ui(ui, |ui| {
                    if ui.selectable_value(&mut new_sort, None, "—").changed() {
                        msgs.push(GridMessage::SetSort {
                            column: new_sort,
                            ascending: sort.ascending,
                        });
                    }
                    for (index, column) in columns.iter().enumerate() {
                        if ui
                            .selectable_value(&mut new_sort, Some(index), &column.label)
                            .changed()
                        {
                            msgs.push(GridMessage::SetSort {
                                column: new_sort,
                                ascending: sort.ascending,
                            });
                        }
                    }
                });

            let direction_label = if sort.ascending { "⬆ ASC" } else { "⬇ DESC" };
            if ui
                .button(RichText::new(direction_label).color(style.header_foreground))
                .on_hover_text("Toggle sort direction")
                .clicked()
            {
                msgs.push(GridMessage::ToggleSortDirection);
            }

            if (filter.is_active() || sort.column.is_some()) && ui.button("✕ Clear").clicked() {
                msgs.push(GridMessage::ClearFilters);
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(
                    RichText::new(format!(
                        "{}/{}",
                        grid.engine().projected_len(),
                        grid.engine().row_count()
                    ))
                    .color(style.foreground),
                );
                let selected = grid.selection_len();
                if selected > 0 {
                    ui.label(
                        RichText::new(format!("{selected} selected"))
                            .italics()
                            .color(style.foreground),
                    );
                    ui.separator();
                }
            });
        });
    });
}

fn draw_table(
    grid: &DataGrid,
    ui: &mut egui::Ui,
    style: GridStyle,
    msgs: &mut Vec<GridMessage>,
) {
    let columns = grid.columns().to_vec();
    let sort = grid.engine().sort();
    let shown = grid.engine().projected_len();
    let row_height = style.row_height;
    let max_height = row_height * (grid.visible_rows() as f32 + 1.0);

    let mut builder = TableBuilder::new(ui)
        .striped(true)
        .vscroll(true)
        .max_scroll_height(max_height)
        .sense(Sense::click())
        .cell_layout(Layout::left_to_right(Align::Center));

    for column in &columns {
        builder = builder.column(
            egui_extras::Column::initial(column.width)
                .resizable(true)
                .clip(true),
        );
    }

    builder
        .header(row_height, |mut header| {
            for (index, column) in columns.iter().enumerate() {
                header.col(|ui| {
                    ui.painter().rect_filled(
                        ui.available_rect_before_wrap(),
                        0.0,
                        style.header_background,
                    );

                    let header_text = match sort_indicator(sort, index) {
                        Some(indicator) => format!("{} {}", column.label, indicator),
                        None => column.label.clone(),
                    };
                    let response = ui.add(
                        egui::Label::new(
                            RichText::new(&header_text)
                                .strong()
                                .color(style.header_foreground),
                        )
                        .selectable(false)
                        .sense(Sense::click()),
                    );
                    if response.clicked() {
                        msgs.push(GridMessage::HeaderClicked(index));
                    }
                    response.on_hover_text("Click to sort");
                });
            }
        })
        .body(|body| {
            body.rows(row_height, shown, |mut table_row| {
                let display_index = table_row.index();
                let Some(row) = grid.engine().projected_row(display_index) else {
                    return;
                };
                let selected = grid.is_selected_display(display_index);
                if selected {
                    table_row.set_selected(true);
                }
                let tag_style = grid.tag_style_for(row);

                for column_index in 0..columns.len() {
                    table_row.col(|ui| {
                        if selected {
                            ui.painter().rect_filled(
                                ui.available_rect_before_wrap(),
                                0.0,
                                style.selection_background,
                            );
                        } else if let Some(background) =
                            tag_style.and_then(|tag| tag.background)
                        {
                            ui.painter().rect_filled(
                                ui.available_rect_before_wrap(),
                                0.0,
                                background,
                            );
                        }

                        let color = tag_style
                            .and_then(|tag| tag.foreground)
                            .unwrap_or(style.foreground);
                        ui.label(RichText::new(row.cell_text(column_index)).color(color));
                    });
                }

                let response = table_row.response();
                if response.clicked() {
                    let modifiers = response.ctx.input(|i| i.modifiers);
                    msgs.push(GridMessage::RowClicked {
                        display_index,
                        ctrl: modifiers.command,
                        shift: modifiers.shift,
                    });
                }
                if response.secondary_clicked() {
                    // Column targeting uses construction-time widths, not
                    // live resized widths.
                    let column = response
                        .interact_pointer_pos()
                        .map_or(0, |pos| column_at(&columns, response.rect.left(), pos.x));
                    msgs.push(GridMessage::ContextMenuOpened {
                        display_index,
                        column,
                    });
                }
                response.context_menu(|ui| draw_context_menu(grid, ui, msgs));
            });
        });
}

fn column_at(columns: &[Column], left: f32, x: f32) -> usize {
    let mut edge = left;
    for (index, column) in columns.iter().enumerate() {
        edge += column.width;
        if x < edge {
            return index;
        }
    }
    columns.len().saturating_sub(1)
}

fn draw_context_menu(grid: &DataGrid, ui: &mut egui::Ui, msgs: &mut Vec<GridMessage>) {
    let menu = grid.menu();
    let menu = menu
        .lock()
        .expect("Failed to lock context menu. Thread poisoned?");

    ui.visuals_mut().override_text_color = Some(menu.foreground);
    ui.visuals_mut().widgets.hovered.weak_bg_fill = menu.hover_background;
    ui.visuals_mut().widgets.active.weak_bg_fill = menu.hover_background;

    for entry in &menu.entries {
        if entry.separator_before {
            ui.separator();
        }
        if ui.button(entry.label).clicked() {
            msgs.push(match entry.action {
                MenuAction::CopyRow => GridMessage::CopySelection,
                MenuAction::CopyCell => {
                    let (display_index, column) = grid.menu_cell().unwrap_or((0, 0));
                    GridMessage::CopyCell {
                        display_index,
                        column,
                    }
                }
                MenuAction::CopyAll => GridMessage::CopyAll,
                MenuAction::ExportCsv => GridMessage::ExportRequested,
                MenuAction::ClearFilters => GridMessage::ClearFilters,
            });
            ui.close_menu();
        }
    }
}

fn draw_export_feedback(grid: &DataGrid, ui: &mut egui::Ui, msgs: &mut Vec<GridMessage>) {
    let Some(feedback) = grid.export_feedback() else {
        return;
    };

    egui::Window::new("Export")
        .id(ui.id().with("export_feedback"))
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ui.ctx(), |ui| {
            ui.label(feedback.to_string());
            ui.vertical_centered(|ui| {
                if ui.button("OK").clicked() {
                    msgs.push(GridMessage::DismissExportFeedback);
                }
            });
        });
}
