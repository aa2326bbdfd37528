mod app;
mod theme;
mod views;

pub use app::AvailabilityApp;
pub use theme::{setup_fonts, setup_theme};
