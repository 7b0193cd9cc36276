//! GUI entry point for Uji Emisi

mod app;
mod list_panel;
mod register_panel;
mod settings_panel;
mod stats_panel;
mod test_modal;
mod worker;

use app::EmisiApp;
use eframe::egui;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn setup_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> eframe::Result<()> {
    setup_tracing();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Uji Emisi",
        options,
        Box::new(|cc| Ok(Box::new(EmisiApp::new(cc)))),
    )
}
