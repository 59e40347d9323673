mod app;
mod data;
mod state;
mod ui;

use app::EmpaqueTimesApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 850.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tiempos de Procesos en Área de Empaque",
        options,
        Box::new(|_cc| Ok(Box::new(EmpaqueTimesApp::default()))),
    )
}
