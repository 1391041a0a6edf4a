use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{CellValue, Dataset};
use crate::data::stats::ColumnSummary;
use crate::definitions::reference_guide;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Load failure
// ---------------------------------------------------------------------------

/// Shown instead of the dashboard when no dataset could be loaded.
pub fn load_failure(ui: &mut Ui, state: &AppState) {
    ui.label(
        RichText::new(format!(
            "Could not load data.\n\n\
             Make sure you either:\n\
             - Upload a cleaned CSV file in the sidebar, or\n\
             - Have a file named `{}` in the working directory.",
            state.config.default_data_path.display()
        ))
        .color(ui.visuals().error_fg_color),
    );
    if let Some(detail) = &state.load_error {
        egui::CollapsingHeader::new("Show error details")
            .id_salt("load_error")
            .show(ui, |ui: &mut Ui| {
                ui.code(detail);
            });
    }
}

// ---------------------------------------------------------------------------
// Dataset overview
// ---------------------------------------------------------------------------

/// Shape, preview rows, summary statistics and the column dictionary.
pub fn dataset_overview(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    ui.heading("Dataset Overview");
    ui.label(format!(
        "Rows: {}   |   Columns: {}",
        dataset.len(),
        dataset.columns.len()
    ));

    ui.push_id("preview", |ui: &mut Ui| {
        preview_table(ui, dataset, state.config.preview_rows);
    });

    egui::CollapsingHeader::new("Show summary statistics")
        .id_salt("summary")
        .show(ui, |ui: &mut Ui| {
            ui.strong("Numeric Columns Summary");
            if state.summary.is_empty() {
                ui.label("No numeric columns.");
            } else {
                summary_table(ui, &state.summary);
            }
        });

    egui::CollapsingHeader::new("Show column info with definitions")
        .id_salt("definitions")
        .show(ui, |ui: &mut Ui| {
            let rows: Vec<[&str; 3]> = state
                .definitions
                .iter()
                .map(|d| [d.column.as_str(), d.dtype, d.description.as_str()])
                .collect();
            text_table(ui, "definitions_table", &["Column", "Data Type", "Definition"], &rows);
        });
}

fn preview_table(ui: &mut Ui, dataset: &Dataset, n: usize) {
    let head = dataset.head(n);
    ScrollArea::horizontal()
        .id_salt("preview_scroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .columns(Column::auto().at_least(60.0), dataset.columns.len())
                .header(20.0, |mut header| {
                    for col in &dataset.columns {
                        header.col(|ui| {
                            ui.strong(&col.name);
                        });
                    }
                })
                .body(|mut body| {
                    for row in head {
                        body.row(18.0, |mut cells| {
                            for value in row {
                                cells.col(|ui| {
                                    ui.label(cell_text(value));
                                });
                            }
                        });
                    }
                });
        });
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Null => "None".to_string(),
        CellValue::Float(f) if f.is_nan() => "NaN".to_string(),
        other => other.to_string(),
    }
}

fn stat_text(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.6}")
    }
}

/// Statistics as rows, numeric columns as columns.
fn summary_table(ui: &mut Ui, summary: &[ColumnSummary]) {
    let stats: [(&str, fn(&ColumnSummary) -> String); 8] = [
        ("count", |s| s.count.to_string()),
        ("mean", |s| stat_text(s.mean)),
        ("std", |s| stat_text(s.std)),
        ("min", |s| stat_text(s.min)),
        ("25%", |s| stat_text(s.q25)),
        ("50%", |s| stat_text(s.median)),
        ("75%", |s| stat_text(s.q75)),
        ("max", |s| stat_text(s.max)),
    ];

    ScrollArea::horizontal()
        .id_salt("summary_scroll")
        .show(ui, |ui: &mut Ui| {
            ui.push_id("summary_table", |ui: &mut Ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .vscroll(false)
                    .columns(Column::auto().at_least(60.0), summary.len() + 1)
                    .header(20.0, |mut header| {
                        header.col(|_ui| {});
                        for s in summary {
                            header.col(|ui| {
                                ui.strong(&s.column);
                            });
                        }
                    })
                    .body(|mut body| {
                        for (name, get) in &stats {
                            body.row(18.0, |mut cells| {
                                cells.col(|ui| {
                                    ui.strong(*name);
                                });
                                for s in summary {
                                    cells.col(|ui| {
                                        ui.label(get(s));
                                    });
                                }
                            });
                        }
                    });
            });
        });
}

fn text_table<const N: usize>(ui: &mut Ui, id: &str, headers: &[&str; N], rows: &[[&str; N]]) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(80.0), N - 1)
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for h in headers {
                    header.col(|ui| {
                        ui.strong(*h);
                    });
                }
            })
            .body(|mut body| {
                for row in rows {
                    body.row(18.0, |mut cells| {
                        for text in row {
                            cells.col(|ui| {
                                ui.label(*text);
                            });
                        }
                    });
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Abbreviation reference guide
// ---------------------------------------------------------------------------

pub fn abbreviation_guide(ui: &mut Ui) {
    ui.heading("Abbreviation Reference Guide");
    ui.label("Some column names use abbreviations. Use this guide to understand what they mean.");
    egui::CollapsingHeader::new("Show abbreviation definitions")
        .id_salt("abbreviations")
        .show(ui, |ui: &mut Ui| {
            for line in reference_guide() {
                ui.label(line);
            }
        });
}
