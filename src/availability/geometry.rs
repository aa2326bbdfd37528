//! Time parsing and pixel geometry for the availability grid

use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 1440;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("expected a time like \"09:30\", got {0:?}")]
    Malformed(String),
    #[error("time {0:?} is outside 00:00-24:00")]
    OutOfRange(String),
}

/// Parse "HH:MM" to minutes since midnight.
/// "24:00" is accepted and maps to the end of the day (1440).
pub fn time_to_minutes(time: &str) -> Result<u16, TimeError> {
    let trimmed = time.trim();
    let malformed = || TimeError::Malformed(time.to_string());

    let (hour_part, minute_part) = trimmed.split_once(':').ok_or_else(malformed)?;
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(hour_part) || hour_part.len() > 2 || minute_part.len() != 2 || !is_digits(minute_part) {
        return Err(malformed());
    }

    let hour: u16 = hour_part.parse().map_err(|_| malformed())?;
    let minute: u16 = minute_part.parse().map_err(|_| malformed())?;

    if minute > 59 || hour > 24 || (hour == 24 && minute > 0) {
        return Err(TimeError::OutOfRange(time.to_string()));
    }

    Ok(hour * 60 + minute)
}

/// Format minutes since midnight as zero-padded "HH:MM".
/// Values past the end of the day are clamped to "24:00".
pub fn minutes_to_time(minutes: u16) -> String {
    let minutes = minutes.min(MINUTES_PER_DAY);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Vertical layout of one day column.
///
/// The column shows `start_minute..end_minute` of the day, one row of
/// `slot_height` pixels per slot. All conversions clamp their input to the
/// visible window, so pointer positions above or below the grid still map to
/// the first or last slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    slot_minutes: u16,
    slot_height: f32,
    start_minute: u16,
    end_minute: u16,
}

impl Geometry {
    /// Build a geometry for the hour window `start_hour..end_hour`.
    /// An empty or inverted window falls back to the whole day.
    pub fn new(slot_minutes: u16, slot_height: f32, start_hour: u8, end_hour: u8) -> Self {
        let slot_minutes = slot_minutes.clamp(1, MINUTES_PER_DAY);
        let slot_height = if slot_height.is_finite() && slot_height > 0.0 {
            slot_height
        } else {
            1.0
        };

        let mut start_minute = (start_hour.min(24) as u16) * 60;
        let mut end_minute = (end_hour.min(24) as u16) * 60;
        if end_minute <= start_minute {
            start_minute = 0;
            end_minute = MINUTES_PER_DAY;
        }

        // Align the window outward to slot boundaries
        start_minute -= start_minute % slot_minutes;
        if end_minute % slot_minutes != 0 {
            end_minute = (end_minute + slot_minutes - end_minute % slot_minutes).min(MINUTES_PER_DAY);
        }

        Self {
            slot_minutes,
            slot_height,
            start_minute,
            end_minute,
        }
    }

    /// Whole-day geometry.
    pub fn full_day(slot_minutes: u16, slot_height: f32) -> Self {
        Self::new(slot_minutes, slot_height, 0, 24)
    }

    pub fn slot_minutes(&self) -> u16 {
        self.slot_minutes
    }

    pub fn slot_height(&self) -> f32 {
        self.slot_height
    }

    pub fn start_minute(&self) -> u16 {
        self.start_minute
    }

    pub fn end_minute(&self) -> u16 {
        self.end_minute
    }

    pub fn visible_slots(&self) -> u16 {
        (self.end_minute - self.start_minute) / self.slot_minutes
    }

    pub fn total_height(&self) -> f32 {
        self.visible_slots() as f32 * self.slot_height
    }

    pub fn pixels_per_minute(&self) -> f32 {
        self.slot_height / self.slot_minutes as f32
    }

    fn clamp_y(&self, y: f32) -> f32 {
        if y.is_nan() {
            return 0.0;
        }
        y.clamp(0.0, self.total_height())
    }

    /// Pixel offset (from the top of the column) of a minute of the day.
    pub fn minutes_to_pixels(&self, minutes: u16) -> f32 {
        let minutes = minutes.clamp(self.start_minute, self.end_minute);
        (minutes - self.start_minute) as f32 * self.slot_height / self.slot_minutes as f32
    }

    /// Minute of the day at a pixel offset, truncated to whole minutes.
    pub fn pixels_to_minutes(&self, y: f32) -> u16 {
        let offset = (self.clamp_y(y) * self.slot_minutes as f32 / self.slot_height).floor() as u16;
        (self.start_minute + offset).min(self.end_minute)
    }

    /// Round a pixel offset to the nearest slot boundary.
    pub fn snap_to_slot(&self, y: f32) -> f32 {
        (self.clamp_y(y) / self.slot_height).round() * self.slot_height
    }

    /// Slot index (within the whole day) of the row under `y`.
    /// Floors rather than rounds: the answer is the row the pointer is over.
    pub fn slot_at(&self, y: f32) -> u16 {
        let row = (self.clamp_y(y) / self.slot_height).floor() as u16;
        let row = row.min(self.visible_slots().saturating_sub(1));
        self.start_minute / self.slot_minutes + row
    }

    /// Top pixel offset of a slot. Slots outside the window clamp to its edges.
    pub fn slot_top(&self, slot: u16) -> f32 {
        self.minutes_to_pixels(slot.saturating_mul(self.slot_minutes))
    }

    pub fn is_slot_visible(&self, slot: u16) -> bool {
        let start = slot as u32 * self.slot_minutes as u32;
        start >= self.start_minute as u32 && start < self.end_minute as u32
    }
}
