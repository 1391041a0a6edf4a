use std::collections::BTreeSet;

use eframe::egui::{self, RichText, ScrollArea, Slider, Ui};

use crate::chart::ChartKind;
use crate::data::filter::{FilterSpec, many_values_hint, numeric_bounds};
use crate::data::model::CellValue;
use crate::data::source::DataSource;
use crate::state::AppState;

const NONE_OPTION: &str = "None";

// ---------------------------------------------------------------------------
// Left side panel – data source, plot settings, filter
// ---------------------------------------------------------------------------

/// Render the sidebar.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            data_source_section(ui, state);

            if state.dataset.is_none() {
                return;
            }
            ui.separator();
            plot_settings_section(ui, state);
            ui.separator();
            filter_section(ui, state);
        });
}

fn data_source_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Source");
    ui.label(state.source.label());
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .button("Upload CSV…")
            .on_hover_text(format!(
                "If you don't upload anything, the app uses '{}'.",
                state.config.default_data_path.display()
            ))
            .clicked()
        {
            open_file_dialog(state);
        }
        let uploaded = matches!(state.source, DataSource::Uploaded { .. });
        if ui
            .add_enabled(uploaded, egui::Button::new("Use default"))
            .clicked()
        {
            state.use_default_source();
        }
    });
}

/// Simple combo box over string options; returns the newly picked option.
fn combo(ui: &mut Ui, id: &str, label: &str, current: &str, options: &[String]) -> Option<String> {
    let mut picked = None;
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for option in options {
                if ui.selectable_label(current == option, option).clicked() && current != option {
                    picked = Some(option.clone());
                }
            }
        });
    picked
}

fn plot_settings_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Plot Settings");

    let kinds: Vec<String> = ChartKind::ALL.iter().map(|k| k.label().to_string()).collect();
    if let Some(picked) = combo(ui, "plot_kind", "Plot type", state.plot.kind.label(), &kinds) {
        if let Some(kind) = ChartKind::ALL.into_iter().find(|k| k.label() == picked) {
            state.set_kind(kind);
        }
    }

    let columns: Vec<String> = match &state.dataset {
        Some(ds) => ds.column_names().map(str::to_string).collect(),
        None => return,
    };

    let x = state.plot.x.clone().unwrap_or_default();
    if let Some(picked) = combo(ui, "x_axis", "X-axis", &x, &columns) {
        state.set_x(picked);
    }

    if state.plot.kind.uses_y() {
        let options = state.y_options();
        if !options.is_empty() {
            let y = state.plot.y.clone().unwrap_or_default();
            if let Some(picked) = combo(ui, "y_axis", "Y-axis", &y, &options) {
                state.set_y(picked);
            }
        }
    }

    let with_none: Vec<String> = std::iter::once(NONE_OPTION.to_string())
        .chain(columns.iter().cloned())
        .collect();
    let color = state.plot.color.clone().unwrap_or_else(|| NONE_OPTION.to_string());
    if let Some(picked) = combo(ui, "color_by", "Color (optional)", &color, &with_none) {
        state.set_color_column((picked != NONE_OPTION).then_some(picked));
    }
}

fn filter_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data (Optional)");

    let Some(dataset) = state.dataset.clone() else {
        return;
    };
    let options: Vec<String> = std::iter::once(NONE_OPTION.to_string())
        .chain(dataset.column_names().map(str::to_string))
        .collect();
    let current = state
        .filter
        .column
        .clone()
        .unwrap_or_else(|| NONE_OPTION.to_string());
    if let Some(picked) = combo(ui, "filter_column", "Column to filter on", &current, &options) {
        state.set_filter_column((picked != NONE_OPTION).then_some(picked));
    }

    let Some(column) = state.filter.column.clone() else {
        return;
    };
    let Some(col) = dataset.column(&column) else {
        return;
    };

    if col.kind.is_numeric() {
        let Some((min, max)) = numeric_bounds(&dataset, &column) else {
            ui.label(format!("{column} has no numeric values."));
            return;
        };
        let (mut lo, mut hi) = match &state.filter.spec {
            Some(FilterSpec::Range { lo, hi }) => (*lo, *hi),
            _ => (min, max),
        };

        ui.label(format!("Range for {column}"));
        let mut changed = ui.add(Slider::new(&mut lo, min..=max).text("min")).changed();
        changed |= ui.add(Slider::new(&mut hi, min..=max).text("max")).changed();
        if changed {
            if lo > hi {
                hi = lo;
            }
            state.set_filter_spec(FilterSpec::Range { lo, hi });
        }
    } else {
        let all: BTreeSet<CellValue> =
            dataset.unique_values.get(&column).cloned().unwrap_or_default();
        if let Some(n) = many_values_hint(&dataset, &column, state.config.many_values_threshold) {
            ui.label(
                RichText::new(format!(
                    "{column} has many unique values ({n}). You can still select a subset below."
                ))
                .italics(),
            );
        }

        let mut selected = match &state.filter.spec {
            Some(FilterSpec::Values(v)) => v.clone(),
            _ => all.clone(),
        };
        let mut changed = false;

        ui.label(format!("Values for {column}  ({}/{})", selected.len(), all.len()));
        ui.horizontal(|ui: &mut Ui| {
            if ui.small_button("All").clicked() {
                selected = all.clone();
                changed = true;
            }
            if ui.small_button("None").clicked() {
                selected.clear();
                changed = true;
            }
        });

        ScrollArea::vertical()
            .id_salt("filter_values")
            .max_height(240.0)
            .show(ui, |ui: &mut Ui| {
                for val in &all {
                    let mut checked = selected.contains(val);
                    if ui.checkbox(&mut checked, val.to_string()).changed() {
                        if checked {
                            selected.insert(val.clone());
                        } else {
                            selected.remove(val);
                        }
                        changed = true;
                    }
                }
            });

        if changed {
            state.set_filter_spec(FilterSpec::Values(selected));
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Upload dataset…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Use default file").clicked() {
                state.use_default_source();
                ui.close_menu();
            }
            let has_chart = state.chart_json().is_some();
            if ui
                .add_enabled(has_chart, egui::Button::new("Export chart spec…"))
                .clicked()
            {
                export_chart_spec(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let visible = state.filtered.as_ref().map_or(0, |f| f.len());
            ui.label(format!("{} rows loaded, {} after filter", ds.len(), visible));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(ui.visuals().error_fg_color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Upload cleaned dataset")
        .add_filter("CSV", &["csv"])
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .pick_file();

    if let Some(path) = file {
        state.upload(&path);
    }
}

fn export_chart_spec(state: &mut AppState) {
    let Some(json) = state.chart_json() else {
        return;
    };
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to serialize chart spec: {e}");
            state.status_message = Some(format!("Error: {e}"));
            return;
        }
    };

    let Some(path) = rfd::FileDialog::new()
        .set_title("Export chart spec")
        .set_file_name("chart.json")
        .add_filter("JSON", &["json"])
        .save_file()
    else {
        return;
    };

    match std::fs::write(&path, json) {
        Ok(()) => {
            log::info!("Exported chart spec to {}", path.display());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to write {}: {e}", path.display());
            state.status_message = Some(format!("Error writing {}: {e}", path.display()));
        }
    }
}
