//! Per-day sets of available slots, stored as one bitset for the whole week

use chrono::Weekday;
use thiserror::Error;

use super::geometry::{minutes_to_time, time_to_minutes, MINUTES_PER_DAY};

pub const MIN_SLOT_MINUTES: u16 = 5;
pub const MAX_SLOT_MINUTES: u16 = 240;
pub const DEFAULT_SLOT_MINUTES: u16 = 30;

/// Days in wire order: index 0 is Sunday.
pub const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn day_index(day: Weekday) -> usize {
    day.num_days_from_sunday() as usize
}

pub fn day_from_index(index: u8) -> Option<Weekday> {
    WEEK.get(index as usize).copied()
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

/// The seven days in display order, starting from `first`.
pub fn week_from(first: Weekday) -> [Weekday; 7] {
    let mut days = [first; 7];
    for i in 1..7 {
        days[i] = days[i - 1].succ();
    }
    days
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotSetError {
    #[error("slot duration of {0} minutes must divide a day evenly and lie within 5-240 minutes")]
    InvalidSlotDuration(u16),
}

pub fn validate_slot_minutes(slot_minutes: u16) -> Result<u16, SlotSetError> {
    if (MIN_SLOT_MINUTES..=MAX_SLOT_MINUTES).contains(&slot_minutes)
        && MINUTES_PER_DAY % slot_minutes == 0
    {
        Ok(slot_minutes)
    } else {
        Err(SlotSetError::InvalidSlotDuration(slot_minutes))
    }
}

/// Whether a toggle adds slots to a day or takes them away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleMode {
    Add,
    Remove,
}

/// Available slots for all seven days.
///
/// Slot `i` of a day starts at `i * slot_minutes` minutes after midnight.
/// Each day owns a fixed run of `u64` words in `bits`, so days never share
/// storage and no operation can leak across a day boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSet {
    slot_minutes: u16,
    slots_per_day: u16,
    words_per_day: usize,
    bits: Vec<u64>,
}

impl SlotSet {
    pub fn new(slot_minutes: u16) -> Result<Self, SlotSetError> {
        validate_slot_minutes(slot_minutes).map(Self::with_layout)
    }

    fn with_layout(slot_minutes: u16) -> Self {
        let slots_per_day = MINUTES_PER_DAY / slot_minutes;
        let words_per_day = (slots_per_day as usize).div_ceil(64);
        Self {
            slot_minutes,
            slots_per_day,
            words_per_day,
            bits: vec![0; words_per_day * WEEK.len()],
        }
    }

    pub fn slot_minutes(&self) -> u16 {
        self.slot_minutes
    }

    /// Number of slots in one day.
    pub fn slot_count(&self) -> u16 {
        self.slots_per_day
    }

    pub fn slot_start(&self, slot: u16) -> u16 {
        slot.saturating_mul(self.slot_minutes).min(MINUTES_PER_DAY)
    }

    /// Slot starting exactly at `minutes`, if that is a slot boundary.
    pub fn slot_for_minutes(&self, minutes: u16) -> Option<u16> {
        if minutes >= MINUTES_PER_DAY || minutes % self.slot_minutes != 0 {
            return None;
        }
        Some(minutes / self.slot_minutes)
    }

    /// Slot starting at an "HH:MM" time, if it parses and lies on a boundary.
    pub fn slot_for_time(&self, time: &str) -> Option<u16> {
        time_to_minutes(time)
            .ok()
            .and_then(|minutes| self.slot_for_minutes(minutes))
    }

    fn position(&self, day: Weekday, slot: u16) -> Option<(usize, u64)> {
        if slot >= self.slots_per_day {
            return None;
        }
        let word = day_index(day) * self.words_per_day + slot as usize / 64;
        Some((word, 1u64 << (slot % 64)))
    }

    fn day_words(&self, day: Weekday) -> &[u64] {
        let base = day_index(day) * self.words_per_day;
        &self.bits[base..base + self.words_per_day]
    }

    pub fn contains(&self, day: Weekday, slot: u16) -> bool {
        self.position(day, slot)
            .map(|(word, mask)| self.bits[word] & mask != 0)
            .unwrap_or(false)
    }

    pub fn contains_time(&self, day: Weekday, time: &str) -> bool {
        self.slot_for_time(time)
            .map(|slot| self.contains(day, slot))
            .unwrap_or(false)
    }

    /// Mark a slot available. Returns true if it was not already.
    pub fn insert(&mut self, day: Weekday, slot: u16) -> bool {
        let Some((word, mask)) = self.position(day, slot) else {
            return false;
        };
        let was_set = self.bits[word] & mask != 0;
        self.bits[word] |= mask;
        !was_set
    }

    /// Mark a slot unavailable. Returns true if it was available.
    pub fn remove(&mut self, day: Weekday, slot: u16) -> bool {
        let Some((word, mask)) = self.position(day, slot) else {
            return false;
        };
        let was_set = self.bits[word] & mask != 0;
        self.bits[word] &= !mask;
        was_set
    }

    /// Apply `mode` to every slot from `first` to `last` inclusive, in either order.
    /// Slots past the end of the day are ignored. Returns how many slots changed.
    pub fn apply_range(&mut self, day: Weekday, first: u16, last: u16, mode: ToggleMode) -> usize {
        let lo = first.min(last);
        let hi = first.max(last).min(self.slots_per_day.saturating_sub(1));
        if lo > hi {
            return 0;
        }
        (lo..=hi)
            .filter(|&slot| match mode {
                ToggleMode::Add => self.insert(day, slot),
                ToggleMode::Remove => self.remove(day, slot),
            })
            .count()
    }

    /// Make every slot of every day unavailable.
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    pub fn day_len(&self, day: Weekday) -> usize {
        self.day_words(day)
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    pub fn is_day_empty(&self, day: Weekday) -> bool {
        self.day_words(day).iter().all(|&word| word == 0)
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&word| word == 0)
    }

    /// Available slots of a day in ascending order.
    pub fn iter_day(&self, day: Weekday) -> impl Iterator<Item = u16> + '_ {
        self.day_words(day)
            .iter()
            .enumerate()
            .flat_map(|(i, &word)| SetBits {
                word,
                offset: i as u16 * 64,
            })
    }

    /// Available slot start times of a day as "HH:MM", ascending.
    pub fn start_times(&self, day: Weekday) -> Vec<String> {
        self.iter_day(day)
            .map(|slot| minutes_to_time(self.slot_start(slot)))
            .collect()
    }
}

impl Default for SlotSet {
    /// An empty week of 30 minute slots.
    fn default() -> Self {
        Self::with_layout(DEFAULT_SLOT_MINUTES)
    }
}

struct SetBits {
    word: u64,
    offset: u16,
}

impl Iterator for SetBits {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        if self.word == 0 {
            return None;
        }
        let bit = self.word.trailing_zeros() as u16;
        self.word &= self.word - 1;
        Some(self.offset + bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(set: &SlotSet, time: &str) -> u16 {
        set.slot_for_time(time).unwrap()
    }

    #[test]
    fn rejects_durations_that_do_not_divide_the_day() {
        assert_eq!(SlotSet::new(7), Err(SlotSetError::InvalidSlotDuration(7)));
        assert_eq!(SlotSet::new(0), Err(SlotSetError::InvalidSlotDuration(0)));
        assert_eq!(SlotSet::new(480), Err(SlotSetError::InvalidSlotDuration(480)));
        assert_eq!(SlotSet::new(30).unwrap().slot_count(), 48);
        assert_eq!(SlotSet::new(5).unwrap().slot_count(), 288);
        assert_eq!(SlotSet::default(), SlotSet::new(DEFAULT_SLOT_MINUTES).unwrap());
    }

    #[test]
    fn insert_and_remove_report_changes() {
        let mut set = SlotSet::new(30).unwrap();
        let nine = slot(&set, "09:00");
        assert!(set.insert(Weekday::Mon, nine));
        assert!(!set.insert(Weekday::Mon, nine));
        assert!(set.contains_time(Weekday::Mon, "09:00"));
        assert!(!set.contains_time(Weekday::Tue, "09:00"));
        assert!(set.remove(Weekday::Mon, nine));
        assert!(!set.remove(Weekday::Mon, nine));
        assert!(set.is_empty());
    }

    #[test]
    fn out_of_range_slots_are_ignored() {
        let mut set = SlotSet::new(30).unwrap();
        assert!(!set.insert(Weekday::Sat, 48));
        assert!(!set.contains(Weekday::Sat, 48));
        assert_eq!(set.slot_for_time("09:15"), None);
        assert_eq!(set.slot_for_time("24:00"), None);
        assert_eq!(set.slot_for_time("junk"), None);
    }

    #[test]
    fn iterates_in_ascending_order_across_words() {
        let mut set = SlotSet::new(5).unwrap();
        for slot in [200, 3, 64, 63, 287] {
            set.insert(Weekday::Wed, slot);
        }
        let slots: Vec<u16> = set.iter_day(Weekday::Wed).collect();
        assert_eq!(slots, vec![3, 63, 64, 200, 287]);
        assert_eq!(set.day_len(Weekday::Wed), 5);
        assert!(set.is_day_empty(Weekday::Thu));
    }

    #[test]
    fn apply_range_is_inclusive_and_order_independent() {
        let mut set = SlotSet::new(30).unwrap();
        let changed = set.apply_range(Weekday::Mon, 20, 18, ToggleMode::Add);
        assert_eq!(changed, 3);
        assert_eq!(set.start_times(Weekday::Mon), vec!["09:00", "09:30", "10:00"]);

        let changed = set.apply_range(Weekday::Mon, 19, 40, ToggleMode::Remove);
        assert_eq!(changed, 2);
        assert_eq!(set.start_times(Weekday::Mon), vec!["09:00"]);
        assert_eq!(set.len(), 1);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.slot_count(), 48);
    }

    #[test]
    fn last_slot_of_a_day_does_not_touch_the_next_day() {
        let mut set = SlotSet::new(30).unwrap();
        set.apply_range(Weekday::Sat, 40, 100, ToggleMode::Add);
        assert_eq!(set.day_len(Weekday::Sat), 8);
        assert!(set.is_day_empty(Weekday::Sun));
        assert_eq!(set.start_times(Weekday::Sat).last().map(String::as_str), Some("23:30"));
    }

    #[test]
    fn week_order_wraps_around() {
        assert_eq!(
            week_from(Weekday::Mon),
            [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun
            ]
        );
        assert_eq!(day_from_index(0), Some(Weekday::Sun));
        assert_eq!(day_from_index(7), None);
        assert_eq!(day_index(Weekday::Sat), 6);
        assert_eq!(day_name(Weekday::Thu), "Thursday");
    }
}
