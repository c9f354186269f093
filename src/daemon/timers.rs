//! One-shot timer queue driven by the main loop
//!
//! Timers are plain data: the loop sleeps until `next_deadline()` and then drains
//! `take_due(now)`. Cancellation removes the entry so it never fires.

use std::time::{Duration, Instant};
use tracing::trace;

use crate::common::types::{OverlayId, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deferred work scheduled by thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Reopen a thumbnail's scroll action gate
    ReleaseThrottle(OverlayId),
    /// Write a captured value back to the shared snap-back animation setting
    RestoreSnapBack(u32),
    /// A cancelled drag finished its snap-back animation
    DragSettled {
        thumbnail: OverlayId,
        drop: Position,
    },
}

#[derive(Debug)]
struct Entry {
    id: TimerId,
    deadline: Instant,
    task: TimerTask,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    entries: Vec<Entry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, after: Duration, task: TimerTask) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        trace!(timer = id.0, ?after, ?task, "Scheduling timer");
        self.entries.push(Entry {
            id,
            deadline: now + after,
            task,
        });
        id
    }

    /// Returns false when the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|entry| entry.deadline).min()
    }

    /// Remove and return every timer whose deadline has passed, oldest first
    pub fn take_due(&mut self, now: Instant) -> Vec<(TimerId, TimerTask)> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.entries.len() {
            if self.entries[index].deadline <= now {
                let entry = self.entries.remove(index);
                due.push((entry.deadline, entry.id, entry.task));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|(deadline, id, _)| (*deadline, *id));
        due.into_iter().map(|(_, id, task)| (id, task)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
