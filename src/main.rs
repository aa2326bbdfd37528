#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod api;
mod availability;
mod config;
mod ui;

use eframe::egui;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slotboard=info")),
        )
        .init();

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1200.0, 900.0])
        .with_min_inner_size([900.0, 700.0])
        .with_title("Slotboard");

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Slotboard",
        options,
        Box::new(|cc| Ok(Box::new(ui::AvailabilityApp::new(cc)?))),
    )
}
