//! Weekly availability model: slot grid, merging, drag editing and the
//! mapping to and from the partner API's schedule format.

mod blocks;
mod drag;
mod geometry;
mod serializer;
mod session;
mod slots;

pub use drag::DragCommit;
pub use geometry::{minutes_to_time, Geometry};
pub use serializer::ScheduleSettings;
pub use session::EditorSession;
pub use slots::{
    validate_slot_minutes, week_from, ToggleMode, DEFAULT_SLOT_MINUTES, MAX_SLOT_MINUTES,
    MIN_SLOT_MINUTES,
};
