use eframe::egui;

use crate::state::{AppState, SectionId};
use crate::ui::{chart, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EmpaqueTimesApp {
    pub state: AppState,
}

impl Default for EmpaqueTimesApp {
    fn default() -> Self {
        Self {
            state: AppState::default(),
        }
    }
}

impl eframe::App for EmpaqueTimesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: the three chart sections ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.store.is_none() {
                ui.centered_and_justified(|ui: &mut egui::Ui| {
                    ui.heading("Open a workbook to view process times  (File → Open…)");
                });
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut egui::Ui| {
                    for id in SectionId::ALL {
                        ui.heading(id.heading());
                        panels::filter_row(ui, &mut self.state, id);
                        ui.add_space(4.0);
                        chart::bar_chart(ui, &self.state, id);
                        ui.add_space(12.0);
                        ui.separator();
                    }
                });
        });
    }
}
