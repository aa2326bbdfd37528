//! Drag-to-toggle selection over one day column

use chrono::Weekday;

use super::slots::{SlotSet, ToggleMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        day: Weekday,
        anchor: u16,
        mode: ToggleMode,
        current: u16,
    },
}

/// Range a drag would touch if released now, lowest slot first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRange {
    pub day: Weekday,
    pub first: u16,
    pub last: u16,
    pub mode: ToggleMode,
}

impl PendingRange {
    pub fn contains(&self, day: Weekday, slot: u16) -> bool {
        self.day == day && (self.first..=self.last).contains(&slot)
    }
}

/// Outcome of a released drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragCommit {
    pub range: PendingRange,
    /// Slots whose availability actually flipped
    pub changed: usize,
}

/// Turns pointer events into one batched add/remove on a [`SlotSet`].
///
/// Nothing is mutated until the pointer is released. Leaving the anchor
/// column or calling [`cancel`](Self::cancel) drops the drag without touching
/// the slots; a later release is then a no-op, even if the pointer came back.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start a drag on `slot`. The mode is fixed here: dragging from an
    /// available slot removes, from an unavailable one adds.
    /// Returns false if a drag is already running or the slot does not exist.
    pub fn pointer_down(&mut self, day: Weekday, slot: u16, slots: &SlotSet) -> bool {
        if self.is_dragging() {
            tracing::debug!(?day, slot, "pointer down ignored, drag already active");
            return false;
        }
        if slot >= slots.slot_count() {
            return false;
        }

        let mode = if slots.contains(day, slot) {
            ToggleMode::Remove
        } else {
            ToggleMode::Add
        };
        tracing::debug!(?day, slot, ?mode, "drag started");
        self.state = DragState::Dragging {
            day,
            anchor: slot,
            mode,
            current: slot,
        };
        true
    }

    /// Track the pointer. Only the current slot changes; moves over another
    /// day are ignored. Returns true if the pending range changed.
    pub fn pointer_move(&mut self, day: Weekday, slot: u16) -> bool {
        match &mut self.state {
            DragState::Dragging {
                day: drag_day,
                current,
                ..
            } if *drag_day == day && *current != slot => {
                *current = slot;
                true
            }
            _ => false,
        }
    }

    /// Release: apply the mode to every slot between anchor and current.
    pub fn pointer_up(&mut self, slots: &mut SlotSet) -> Option<DragCommit> {
        let range = self.pending()?;
        self.state = DragState::Idle;

        let changed = slots.apply_range(range.day, range.first, range.last, range.mode);
        tracing::debug!(
            day = ?range.day,
            first = range.first,
            last = range.last,
            mode = ?range.mode,
            changed,
            "drag committed"
        );
        Some(DragCommit { range, changed })
    }

    /// The pointer left a day column. Aborts the drag if it was anchored there.
    pub fn pointer_leave(&mut self, day: Weekday) -> bool {
        match self.state {
            DragState::Dragging { day: drag_day, .. } if drag_day == day => {
                tracing::debug!(?day, "drag aborted, pointer left column");
                self.state = DragState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }

    pub fn pending(&self) -> Option<PendingRange> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging {
                day,
                anchor,
                mode,
                current,
            } => Some(PendingRange {
                day,
                first: anchor.min(current),
                last: anchor.max(current),
                mode,
            }),
        }
    }
}
