#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use egui::{Frame, Margin, Stroke, Visuals};
use libtabula::config::ThemePalette;
use libtabula::message::GridMessage;
use libtabula::style::StyleRegistry;
use libtabula::table::{Column, DataGrid, Row, TagStyle, draw_data_grid};
use libtabula::theme::ThemeRegistry;
use log::error;

#[derive(clap::Parser, Default)]
#[command(version, about)]
struct Args {
    /// Theme to start with (a built-in name or a theme file in the config
    /// directory)
    #[clap(long, short)]
    theme: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    setup_logging()?;

    let args = Args::parse();

    let palette = ThemePalette::new(args.theme.clone())?;
    let theme = ThemeRegistry::new(palette);
    let styles = StyleRegistry::new(theme.clone());
    let app = FleetApp::new(&theme, &styles, args.theme);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(egui::vec2(1100.0, 720.0)),
        ..Default::default()
    };

    eframe::run_native(
        "Tabula",
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(get_visuals(&theme.palette()));
            let ctx = cc.egui_ctx.clone();
            let weak = Arc::downgrade(&theme);
            theme.register_listener(move || {
                if let Some(theme) = weak.upgrade() {
                    ctx.set_visuals(get_visuals(&theme.palette()));
                    ctx.request_repaint();
                }
            });
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| eyre!("Failed to start UI: {e}"))
}

fn setup_logging() -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] {} — {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn get_visuals(palette: &ThemePalette) -> Visuals {
    let base = if palette.background.r() < 128 {
        Visuals::dark()
    } else {
        Visuals::light()
    };
    Visuals {
        override_text_color: Some(palette.text),
        extreme_bg_color: palette.surface_alt,
        panel_fill: palette.background,
        window_fill: palette.surface,
        window_stroke: Stroke {
            width: 1.0,
            color: palette.border,
        },
        ..base
    }
}

struct FleetApp {
    theme: Arc<ThemeRegistry>,
    current_theme: Option<String>,
    fleet: DataGrid,
    alerts: DataGrid,
}

impl FleetApp {
    fn new(
        theme: &Arc<ThemeRegistry>,
        styles: &Arc<StyleRegistry>,
        current_theme: Option<String>,
    ) -> Self {
        let palette = theme.palette();

        let mut fleet = DataGrid::new(
            vec![
                Column::new("Vehicle", 100.0),
                Column::new("Driver", 140.0),
                Column::new("Speed", 90.0),
                Column::new("Battery", 90.0),
                Column::new("Voltage", 90.0),
                Column::new("Status", 120.0),
            ],
            "fleet",
            None,
            12,
            theme,
            styles,
        )
        .with_export_prefix("fleet");
        fleet.load(fleet_rows());

        let mut alerts = DataGrid::new(
            vec![
                Column::new("Time", 90.0),
                Column::new("Vehicle", 100.0),
                Column::new("Severity", 100.0),
                Column::new("Message", 320.0),
            ],
            "alerts",
            Some(palette.warn),
            8,
            theme,
            styles,
        )
        .with_export_prefix("alerts");
        alerts.load(alert_rows());

        Self {
            theme: theme.clone(),
            current_theme,
            fleet,
            alerts,
        }
    }

    fn refresh_tag_styles(&mut self) {
        let palette = self.theme.palette();
        for grid in [&mut self.fleet, &mut self.alerts] {
            grid.tag_style(
                "warn",
                TagStyle {
                    background: None,
                    foreground: Some(palette.warn),
                },
            );
            grid.tag_style(
                "danger",
                TagStyle {
                    background: None,
                    foreground: Some(palette.danger),
                },
            );
            grid.tag_style(
                "ok",
                TagStyle {
                    background: None,
                    foreground: Some(palette.success),
                },
            );
        }
    }

    fn handle_export_requests(&mut self) {
        for grid in [&mut self.fleet, &mut self.alerts] {
            if grid.take_export_request() {
                export_grid(grid);
            }
        }
    }

    fn draw_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menubar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Export fleet CSV…").clicked() {
                        export_grid(&mut self.fleet);
                        ui.close_menu();
                    }
                    if ui.button("Export alerts CSV…").clicked() {
                        export_grid(&mut self.alerts);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("View", |ui| {
                    let theme_names = self.theme.palette().theme_names.clone();
                    for name in theme_names {
                        let selected = self.current_theme.as_deref() == Some(name.as_str());
                        if ui.selectable_label(selected, &name).clicked() {
                            if let Err(e) = self.theme.select_theme(Some(name.clone())) {
                                error!("{e:#}");
                            } else {
                                self.current_theme = Some(name);
                            }
                            ui.close_menu();
                        }
                    }
                });
            });
        });
    }

    fn draw_statusbar(&self, ctx: &egui::Context) {
        let palette = self.theme.palette();
        egui::TopBottomPanel::bottom("statusbar")
            .frame(Frame {
                fill: palette.surface_raised,
                inner_margin: Margin {
                    left: 5,
                    right: 5,
                    top: 2,
                    bottom: 2,
                },
                ..Default::default()
            })
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!(
                        "Theme: {}",
                        self.current_theme.as_deref().unwrap_or("dark")
                    ));
                    ui.separator();
                    ui.label(format!(
                        "{} vehicles, {} alerts",
                        self.fleet.engine().row_count(),
                        self.alerts.engine().row_count()
                    ));
                });
            });
    }
}

impl eframe::App for FleetApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.refresh_tag_styles();
        self.draw_menu_bar(ctx);
        self.draw_statusbar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Fleet");
            draw_data_grid(&mut self.fleet, ui);
            ui.add_space(12.0);
            ui.heading("Alerts");
            draw_data_grid(&mut self.alerts, ui);
        });

        self.handle_export_requests();
    }
}

fn export_grid(grid: &mut DataGrid) {
    let destination = rfd::FileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name(grid.default_export_filename())
        .save_file();
    if let Some(path) = destination {
        grid.update(GridMessage::ExportCsv(path));
    }
}

fn fleet_rows() -> Vec<Row> {
    vec![
        Row::tagged(
            vec![
                "BR-042".into(),
                "M. Santos".into(),
                "85km/h".into(),
                "42%".into(),
                "12.6V".into(),
                "Moving".into(),
            ],
            ["warn"],
        ),
        Row::new(vec![
            "BR-117".into(),
            "A. Costa".into(),
            "0km/h".into(),
            "88%".into(),
            "12.8V".into(),
            "Parked".into(),
        ]),
        Row::tagged(
            vec![
                "BR-203".into(),
                "J. Oliveira".into(),
                "132km/h".into(),
                "67%".into(),
                "13.1V".into(),
                "Speeding".into(),
            ],
            ["danger"],
        ),
        Row::new(vec![
            "BR-310".into(),
            "R. Lima".into(),
            "54km/h".into(),
            "71%".into(),
            "12.9V".into(),
            "Moving".into(),
        ]),
        Row::tagged(
            vec![
                "BR-455".into(),
                "—".into(),
                "—".into(),
                "5%".into(),
                "11.2V".into(),
                "Offline".into(),
            ],
            ["danger"],
        ),
        Row::tagged(
            vec![
                "BR-508".into(),
                "P. Ferreira".into(),
                "23km/h".into(),
                "96%".into(),
                "13.4V".into(),
                "Moving".into(),
            ],
            ["ok"],
        ),
    ]
}

fn alert_rows() -> Vec<Row> {
    vec![
        Row::tagged(
            vec![
                "08:12".into(),
                "BR-203".into(),
                "High".into(),
                "Speed limit exceeded on BR-101".into(),
            ],
            ["danger"],
        ),
        Row::tagged(
            vec![
                "08:05".into(),
                "BR-455".into(),
                "High".into(),
                "Tracker offline for more than 2 hours".into(),
            ],
            ["danger"],
        ),
        Row::tagged(
            vec![
                "07:48".into(),
                "BR-042".into(),
                "Medium".into(),
                "Battery below 50%".into(),
            ],
            ["warn"],
        ),
        Row::new(vec![
            "07:30".into(),
            "BR-310".into(),
            "Low".into(),
            "Scheduled maintenance due next week".into(),
        ]),
    ]
}
