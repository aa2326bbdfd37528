mod types;
mod client;

pub use types::*;
pub use client::{is_network_error, ScheduleClient};
