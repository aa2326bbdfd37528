//! Merging available slots into contiguous display blocks, and back

use chrono::Weekday;

use super::geometry::minutes_to_time;
use super::slots::{SlotSet, SlotSetError, WEEK};

/// A maximal run of contiguous available slots on one day.
/// `start` and `end` are minutes since midnight; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityBlock {
    pub day: Weekday,
    pub start: u16,
    pub end: u16,
}

impl AvailabilityBlock {
    pub fn duration_minutes(&self) -> u16 {
        self.end - self.start
    }

    pub fn start_time(&self) -> String {
        minutes_to_time(self.start)
    }

    pub fn end_time(&self) -> String {
        minutes_to_time(self.end)
    }

    /// "09:00–10:30"
    pub fn label(&self) -> String {
        format!("{}–{}", self.start_time(), self.end_time())
    }
}

/// Merge slot start minutes of one day into blocks.
///
/// Starts are sorted and deduplicated, then scanned once: a start equal to the
/// running block's end extends it, anything else closes it and opens a new one.
pub fn merge_starts(
    day: Weekday,
    starts: impl IntoIterator<Item = u16>,
    slot_minutes: u16,
) -> Vec<AvailabilityBlock> {
    let mut starts: Vec<u16> = starts.into_iter().collect();
    starts.sort_unstable();
    starts.dedup();

    let mut blocks: Vec<AvailabilityBlock> = Vec::new();
    for start in starts {
        match blocks.last_mut() {
            Some(current) if current.end == start => current.end += slot_minutes,
            _ => blocks.push(AvailabilityBlock {
                day,
                start,
                end: start + slot_minutes,
            }),
        }
    }
    blocks
}

pub fn merge_day(slots: &SlotSet, day: Weekday) -> Vec<AvailabilityBlock> {
    merge_starts(
        day,
        slots.iter_day(day).map(|slot| slots.slot_start(slot)),
        slots.slot_minutes(),
    )
}

/// Blocks for every day, Sunday first.
pub fn merge_week(slots: &SlotSet) -> Vec<AvailabilityBlock> {
    WEEK.iter().flat_map(|&day| merge_day(slots, day)).collect()
}

/// Expand blocks back into a slot set. Block edges that fall inside a slot
/// cover that whole slot.
pub fn expand(blocks: &[AvailabilityBlock], slot_minutes: u16) -> Result<SlotSet, SlotSetError> {
    let mut slots = SlotSet::new(slot_minutes)?;
    for block in blocks {
        if block.end <= block.start {
            continue;
        }
        let first = block.start / slot_minutes;
        let last = (block.end - 1) / slot_minutes;
        for slot in first..=last {
            slots.insert(block.day, slot);
        }
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::slots::ToggleMode;

    fn monday(times: &[&str]) -> SlotSet {
        let mut set = SlotSet::new(30).unwrap();
        for time in times {
            let slot = set.slot_for_time(time).unwrap();
            set.insert(Weekday::Mon, slot);
        }
        set
    }

    fn labels(blocks: &[AvailabilityBlock]) -> Vec<String> {
        blocks.iter().map(AvailabilityBlock::label).collect()
    }

    #[test]
    fn merges_runs_and_splits_on_gaps() {
        let mut set = monday(&["09:00", "09:30", "10:00", "11:00"]);
        let blocks = merge_day(&set, Weekday::Mon);
        assert_eq!(labels(&blocks), vec!["09:00–10:30", "11:00–11:30"]);

        let half_ten = set.slot_for_time("10:30").unwrap();
        set.insert(Weekday::Mon, half_ten);
        assert_eq!(labels(&merge_day(&set, Weekday::Mon)), vec!["09:00–11:30"]);
    }

    #[test]
    fn empty_and_single_slot_days() {
        let set = monday(&["23:30"]);
        assert!(merge_day(&set, Weekday::Tue).is_empty());

        let blocks = merge_day(&set, Weekday::Mon);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].duration_minutes(), 30);
        assert_eq!(blocks[0].end_time(), "24:00");
    }

    #[test]
    fn unsorted_duplicate_starts_merge_the_same() {
        let blocks = merge_starts(Weekday::Fri, [600, 540, 570, 570, 720], 30);
        assert_eq!(labels(&blocks), vec!["09:00–10:30", "12:00–12:30"]);
    }

    #[test]
    fn blocks_never_cross_days() {
        let mut set = SlotSet::new(60).unwrap();
        set.insert(Weekday::Mon, 23);
        set.insert(Weekday::Tue, 0);
        let week = merge_week(&set);
        assert_eq!(week.len(), 2);
        assert_eq!(week[0].day, Weekday::Mon);
        assert_eq!(week[1].day, Weekday::Tue);
    }

    #[test]
    fn blocks_are_sorted_and_disjoint() {
        let mut set = SlotSet::new(15).unwrap();
        for (first, last) in [(70, 80), (4, 9), (30, 31), (11, 11), (90, 95)] {
            set.apply_range(Weekday::Wed, first, last, ToggleMode::Add);
        }
        let blocks = merge_day(&set, Weekday::Wed);
        for pair in blocks.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
        for block in &blocks {
            assert_eq!(block.duration_minutes() % 15, 0);
        }
    }

    #[test]
    fn expand_inverts_merge() {
        let mut set = SlotSet::new(30).unwrap();
        set.apply_range(Weekday::Sun, 0, 3, ToggleMode::Add);
        set.apply_range(Weekday::Thu, 18, 33, ToggleMode::Add);
        set.apply_range(Weekday::Thu, 40, 47, ToggleMode::Add);
        set.insert(Weekday::Sat, 47);

        let blocks = merge_week(&set);
        let expanded = expand(&blocks, 30).unwrap();
        assert_eq!(expanded, set);
        assert_eq!(merge_week(&expanded), blocks);
    }
}
