//! One partner's editing session: slots, drag state and save bookkeeping

use chrono::Weekday;

use super::blocks::{self, AvailabilityBlock};
use super::drag::{DragCommit, DragController, PendingRange};
use super::serializer::{self, ScheduleSettings};
use super::slots::SlotSet;
use crate::api::WeeklySchedule;

/// Owns the slot set for the lifetime of an editing session.
///
/// Every change bumps `revision`. A save snapshots the revision it was
/// built from, so a save that completes after further edits does not clear
/// the unsaved flag for those edits. Only one save may be in flight.
#[derive(Debug)]
pub struct EditorSession {
    partner_id: String,
    slots: SlotSet,
    drag: DragController,
    settings: ScheduleSettings,
    revision: u64,
    saved_revision: u64,
    saving_revision: Option<u64>,
}

impl EditorSession {
    /// Blank week for a partner with no stored availability.
    pub fn new(partner_id: impl Into<String>, settings: ScheduleSettings) -> Self {
        Self::load(partner_id, None, &settings)
    }

    /// Start a session from a fetched schedule. Missing or malformed
    /// schedules give a blank week built from `fallback`.
    pub fn load(
        partner_id: impl Into<String>,
        schedule: Option<&WeeklySchedule>,
        fallback: &ScheduleSettings,
    ) -> Self {
        let (slots, mut settings) = serializer::load_or_empty(schedule, fallback);
        settings.slot_duration_minutes = slots.slot_minutes();
        Self {
            partner_id: partner_id.into(),
            slots,
            drag: DragController::new(),
            settings,
            revision: 0,
            saved_revision: 0,
            saving_revision: None,
        }
    }

    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    pub fn slot_minutes(&self) -> u16 {
        self.slots.slot_minutes()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn is_saving(&self) -> bool {
        self.saving_revision.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn pending(&self) -> Option<PendingRange> {
        self.drag.pending()
    }

    pub fn pointer_down(&mut self, day: Weekday, slot: u16) -> bool {
        self.drag.pointer_down(day, slot, &self.slots)
    }

    pub fn pointer_move(&mut self, day: Weekday, slot: u16) -> bool {
        self.drag.pointer_move(day, slot)
    }

    pub fn pointer_up(&mut self) -> Option<DragCommit> {
        let commit = self.drag.pointer_up(&mut self.slots)?;
        if commit.changed > 0 {
            self.revision += 1;
        }
        Some(commit)
    }

    pub fn pointer_leave(&mut self, day: Weekday) -> bool {
        self.drag.pointer_leave(day)
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.drag.cancel()
    }

    /// Change buffer time and booking horizon. Counts as an edit when a value differs.
    pub fn set_booking_rules(&mut self, buffer_time_minutes: u16, max_advance_booking_days: u16) {
        if self.settings.buffer_time_minutes == buffer_time_minutes
            && self.settings.max_advance_booking_days == max_advance_booking_days
        {
            return;
        }
        self.settings.buffer_time_minutes = buffer_time_minutes;
        self.settings.max_advance_booking_days = max_advance_booking_days;
        self.revision += 1;
    }

    pub fn blocks(&self, day: Weekday) -> Vec<AvailabilityBlock> {
        blocks::merge_day(&self.slots, day)
    }

    pub fn week_blocks(&self) -> Vec<AvailabilityBlock> {
        blocks::merge_week(&self.slots)
    }

    /// Build the full schedule to send. Returns `None` while another save is
    /// still in flight, since two full-replace writes could land out of order.
    pub fn begin_save(&mut self) -> Option<WeeklySchedule> {
        if self.saving_revision.is_some() {
            tracing::debug!(partner_id = %self.partner_id, "save already in flight");
            return None;
        }
        self.saving_revision = Some(self.revision);
        Some(serializer::save(&self.slots, &self.partner_id, &self.settings))
    }

    /// Record the outcome of the save started by [`begin_save`](Self::begin_save).
    /// A failure leaves the slots and the unsaved flag as they are.
    pub fn finish_save(&mut self, succeeded: bool) {
        let Some(revision) = self.saving_revision.take() else {
            return;
        };
        if succeeded {
            self.saved_revision = revision;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditorSession {
        EditorSession::new("p-1", ScheduleSettings::default())
    }

    fn drag(session: &mut EditorSession, day: Weekday, from: u16, to: u16) -> Option<DragCommit> {
        session.pointer_down(day, from);
        session.pointer_move(day, to);
        session.pointer_up()
    }

    #[test]
    fn committed_drag_marks_unsaved() {
        let mut s = session();
        assert!(!s.has_unsaved_changes());
        drag(&mut s, Weekday::Mon, 18, 20);
        assert!(s.has_unsaved_changes());
        assert_eq!(s.blocks(Weekday::Mon)[0].label(), "09:00–10:30");
        assert_eq!(s.week_blocks().len(), 1);
    }

    #[test]
    fn aborted_drag_changes_nothing() {
        let mut s = session();
        s.pointer_down(Weekday::Mon, 18);
        s.pointer_move(Weekday::Mon, 22);
        assert!(s.pointer_leave(Weekday::Mon));
        assert_eq!(s.pointer_up(), None);
        assert!(s.slots().is_empty());
        assert!(!s.has_unsaved_changes());
    }

    #[test]
    fn successful_save_clears_unsaved() {
        let mut s = session();
        drag(&mut s, Weekday::Tue, 10, 12);
        let schedule = s.begin_save().unwrap();
        assert!(s.is_saving());
        assert!(schedule.schedule[2].is_enabled);
        s.finish_save(true);
        assert!(!s.is_saving());
        assert!(!s.has_unsaved_changes());
    }

    #[test]
    fn failed_save_keeps_edits_and_flag() {
        let mut s = session();
        drag(&mut s, Weekday::Tue, 10, 12);
        let before = s.slots().clone();
        s.begin_save().unwrap();
        s.finish_save(false);
        assert!(s.has_unsaved_changes());
        assert_eq!(s.slots(), &before);
        // retry is allowed
        assert!(s.begin_save().is_some());
    }

    #[test]
    fn second_save_waits_for_the_first() {
        let mut s = session();
        drag(&mut s, Weekday::Wed, 0, 1);
        assert!(s.begin_save().is_some());
        assert!(s.begin_save().is_none());
        s.finish_save(true);
        assert!(s.begin_save().is_some());
    }

    #[test]
    fn edits_during_save_stay_unsaved() {
        let mut s = session();
        drag(&mut s, Weekday::Wed, 0, 1);
        s.begin_save().unwrap();
        drag(&mut s, Weekday::Thu, 5, 5);
        s.finish_save(true);
        assert!(s.has_unsaved_changes());
    }

    #[test]
    fn toggling_back_still_counts_as_unsaved() {
        let mut s = session();
        drag(&mut s, Weekday::Fri, 4, 6);
        s.begin_save().unwrap();
        s.finish_save(true);

        let added = drag(&mut s, Weekday::Sat, 7, 7);
        assert_eq!(added.map(|c| c.changed), Some(1));
        let removed = drag(&mut s, Weekday::Sat, 7, 7);
        assert_eq!(removed.map(|c| c.range.mode), Some(crate::availability::slots::ToggleMode::Remove));
        assert!(s.slots().is_day_empty(Weekday::Sat));
        assert!(s.has_unsaved_changes());
    }

    #[test]
    fn booking_rules_change_counts_as_edit() {
        let mut s = session();
        s.set_booking_rules(0, 30);
        assert!(!s.has_unsaved_changes());
        s.set_booking_rules(15, 30);
        assert!(s.has_unsaved_changes());
        let schedule = s.begin_save().unwrap();
        assert_eq!(schedule.buffer_time_minutes, 15);
    }

    #[test]
    fn loads_existing_schedule() {
        let mut original = session();
        drag(&mut original, Weekday::Sun, 16, 19);
        original.set_booking_rules(5, 14);
        let schedule = original.begin_save().unwrap();

        let reloaded = EditorSession::load("p-1", Some(&schedule), &ScheduleSettings::default());
        assert_eq!(reloaded.slots(), original.slots());
        assert_eq!(reloaded.settings().buffer_time_minutes, 5);
        assert_eq!(reloaded.settings().max_advance_booking_days, 14);
        assert!(!reloaded.has_unsaved_changes());
    }
}
