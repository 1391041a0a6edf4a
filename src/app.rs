use eframe::egui::{self, ScrollArea, Ui};

use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui::{overview, panels, plot, reference};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: data source, plot settings, filter ----
        egui::SidePanel::left("sidebar")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: overview, chart, reference ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.heading("EJI 2024 New Mexico – Clean Dataset Dashboard");
                    ui.label(
                        "This app displays the cleaned EJI 2024 New Mexico dataset and provides an \
                         interactive dashboard for visual exploration. The dataset was cleaned in \
                         MATLAB and saved as EJI_2024_New_Mexico_CLEAN.csv.",
                    );
                    ui.separator();

                    if self.state.dataset.is_none() {
                        overview::load_failure(ui, &self.state);
                        return;
                    }

                    overview::dataset_overview(ui, &self.state);
                    ui.separator();
                    overview::abbreviation_guide(ui);
                    ui.separator();
                    plot::chart_section(ui, &self.state);
                    ui.separator();
                    reference::cleaning_script(ui);
                });
        });
    }
}
