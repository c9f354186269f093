//! Scroll action throttle
//!
//! A single gate serializes scroll-triggered actions of one thumbnail: an idle gate
//! accepts the action and arms a one-shot timer, an armed gate drops everything
//! until that timer fires.

use std::time::{Duration, Instant};
use tracing::trace;

use crate::common::types::OverlayId;

use super::timers::{TimerId, TimerQueue, TimerTask};

#[derive(Debug, Default)]
pub struct ActionThrottle {
    timer: Option<TimerId>,
}

impl ActionThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Gate duration for the current wheel mode.
    ///
    /// Switching the mirrored window changes what the user looks at, so the
    /// "reverse" mode waits the full base interval; the normal mode waits half.
    /// The choice depends only on the mode flag, whatever action ends up running.
    pub fn interval(base: Duration, reverse_wheel: bool) -> Duration {
        if reverse_wheel { base } else { base / 2 }
    }

    /// Returns true and arms the gate when idle, false when already armed
    pub fn try_acquire(
        &mut self,
        timers: &mut TimerQueue,
        now: Instant,
        owner: OverlayId,
        base: Duration,
        reverse_wheel: bool,
    ) -> bool {
        if self.timer.is_some() {
            trace!(thumbnail = %owner, "Scroll action throttled");
            return false;
        }

        let interval = Self::interval(base, reverse_wheel);
        self.timer = Some(timers.schedule(now, interval, TimerTask::ReleaseThrottle(owner)));
        true
    }

    /// Timer callback. Ignores timers this gate no longer owns.
    pub fn release(&mut self, fired: TimerId) -> bool {
        if self.timer == Some(fired) {
            self.timer = None;
            true
        } else {
            false
        }
    }

    /// Drop a pending timer without waiting for it
    pub fn cancel(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
    }
}
