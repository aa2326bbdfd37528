//! Conversion between the in-memory slot set and the persisted weekly schedule

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::{minutes_to_time, time_to_minutes};
use super::slots::{day_from_index, day_name, SlotSet, SlotSetError, DEFAULT_SLOT_MINUTES, WEEK};
use crate::api::{DaySchedule, SlotRecord, WeeklySchedule};

/// Booking metadata stored alongside the slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    pub slot_duration_minutes: u16,
    pub buffer_time_minutes: u16,
    pub max_advance_booking_days: u16,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            slot_duration_minutes: DEFAULT_SLOT_MINUTES,
            buffer_time_minutes: 0,
            max_advance_booking_days: 30,
        }
    }
}

impl ScheduleSettings {
    pub fn from_schedule(schedule: &WeeklySchedule) -> Self {
        Self {
            slot_duration_minutes: schedule.slot_duration_minutes,
            buffer_time_minutes: schedule.buffer_time_minutes,
            max_advance_booking_days: schedule.max_advance_booking_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    SlotDuration(#[from] SlotSetError),
    #[error("day index {0} is outside 0-6")]
    DayOutOfRange(u8),
    #[error("day {0} appears more than once")]
    DuplicateDay(u8),
    #[error("day {day}: start time {time:?} is not a slot boundary")]
    BadStartTime { day: u8, time: String },
}

/// Expand a slot set into the exhaustive schedule: seven days, Sunday first,
/// each with one record per slot in chronological order.
pub fn save(slots: &SlotSet, partner_id: &str, settings: &ScheduleSettings) -> WeeklySchedule {
    let slot_minutes = slots.slot_minutes();
    let schedule = WEEK
        .iter()
        .map(|&day| {
            let records = (0..slots.slot_count())
                .map(|slot| {
                    let start = slots.slot_start(slot);
                    SlotRecord {
                        start_time: minutes_to_time(start),
                        end_time: minutes_to_time(start + slot_minutes),
                        is_available: slots.contains(day, slot),
                    }
                })
                .collect();
            DaySchedule {
                day_of_week: day.num_days_from_sunday() as u8,
                day_name: day_name(day).to_string(),
                is_enabled: !slots.is_day_empty(day),
                slots: records,
            }
        })
        .collect();

    WeeklySchedule {
        partner_id: partner_id.to_string(),
        schedule,
        slot_duration_minutes: slot_minutes,
        buffer_time_minutes: settings.buffer_time_minutes,
        max_advance_booking_days: settings.max_advance_booking_days,
    }
}

/// Collapse a schedule back to the slots marked available.
///
/// Only available records are inspected; unavailable ones carry no
/// information. Days that are absent stay empty.
pub fn load(schedule: &WeeklySchedule) -> Result<SlotSet, ScheduleError> {
    let mut slots = SlotSet::new(schedule.slot_duration_minutes)?;
    let mut seen = [false; 7];

    for day_schedule in &schedule.schedule {
        let index = day_schedule.day_of_week;
        let day = day_from_index(index).ok_or(ScheduleError::DayOutOfRange(index))?;
        if std::mem::replace(&mut seen[index as usize], true) {
            return Err(ScheduleError::DuplicateDay(index));
        }

        for record in day_schedule.slots.iter().filter(|r| r.is_available) {
            let slot = time_to_minutes(&record.start_time)
                .ok()
                .and_then(|minutes| slots.slot_for_minutes(minutes))
                .ok_or_else(|| ScheduleError::BadStartTime {
                    day: index,
                    time: record.start_time.clone(),
                })?;
            slots.insert(day, slot);
        }
    }

    Ok(slots)
}

/// Load a schedule, falling back to an empty week when it is missing or
/// malformed. The returned settings come from the schedule when it loads,
/// otherwise from `fallback`.
pub fn load_or_empty(
    schedule: Option<&WeeklySchedule>,
    fallback: &ScheduleSettings,
) -> (SlotSet, ScheduleSettings) {
    if let Some(schedule) = schedule {
        match load(schedule) {
            Ok(slots) => return (slots, ScheduleSettings::from_schedule(schedule)),
            Err(e) => {
                tracing::warn!(partner_id = %schedule.partner_id, error = %e, "ignoring malformed schedule");
            }
        }
    }
    (empty_week(fallback.slot_duration_minutes), *fallback)
}

/// Empty slot set, or the default layout if `slot_minutes` is unusable.
pub fn empty_week(slot_minutes: u16) -> SlotSet {
    SlotSet::new(slot_minutes).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default slot duration");
        SlotSet::default()
    })
}
