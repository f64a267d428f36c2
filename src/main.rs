mod app;
mod color;
mod state;
mod ui;

use app::CogmApp;
use cogm_calculator::config::ViewerConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewerConfig::from_env();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size(config.min_window_size),
        ..Default::default()
    };

    eframe::run_native(
        "COGM Calculator",
        options,
        Box::new(|_cc| Ok(Box::new(CogmApp::new(config)))),
    )
}
