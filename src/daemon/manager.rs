//! Owner of every live thumbnail
//!
//! Routes pointer input, source window notifications and fired timers to the
//! right thumbnail, and drops thumbnails once they are torn down.

use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::common::types::{Dimensions, EventResponse, OverlayId, PointerEvent, WindowId};
use crate::config::Settings;

use super::backend::WindowSystem;
use super::drag::SnapBackSetting;
use super::thumbnail::{Thumbnail, ThumbnailContext};
use super::timers::{TimerId, TimerQueue, TimerTask};

pub struct ThumbnailManager<W: WindowSystem> {
    windows: W,
    thumbnails: Vec<Thumbnail<W::Overlay>>,
    timers: TimerQueue,
    snap_back: SnapBackSetting,
    settings: Settings,
}

/// Build a context over the manager's fields without borrowing `thumbnails`
macro_rules! context {
    ($manager:expr, $now:expr) => {
        ThumbnailContext {
            windows: &mut $manager.windows,
            timers: &mut $manager.timers,
            snap_back: &$manager.snap_back,
            settings: &$manager.settings,
            now: $now,
        }
    };
}

impl<W: WindowSystem> ThumbnailManager<W> {
    pub fn new(windows: W, settings: Settings) -> Self {
        Self {
            windows,
            thumbnails: Vec::new(),
            timers: TimerQueue::new(),
            snap_back: SnapBackSetting::new(settings.snap_back_animation_ms),
            settings,
        }
    }

    /// Create and show a thumbnail for `source`
    pub fn open(&mut self, source: WindowId, now: Instant) -> Result<OverlayId> {
        let thumbnail = Thumbnail::new(&mut context!(self, now), source)?;
        let id = thumbnail.id();
        self.thumbnails.push(thumbnail);
        Ok(id)
    }

    /// Tear down and forget a thumbnail. Returns false if it was unknown.
    pub fn remove(&mut self, id: OverlayId, now: Instant) -> bool {
        let Some(index) = self.thumbnails.iter().position(|t| t.id() == id) else {
            return false;
        };
        let mut thumbnail = self.thumbnails.remove(index);
        thumbnail.teardown(&mut context!(self, now));
        true
    }

    pub fn handle_pointer(&mut self, id: OverlayId, event: PointerEvent, now: Instant) -> EventResponse {
        let Some(thumbnail) = self.thumbnails.iter_mut().find(|t| t.id() == id) else {
            return EventResponse::Propagate;
        };
        let response = thumbnail.handle_pointer(&mut context!(self, now), event);
        trace!(
            thumbnail = %id,
            state = ?thumbnail.state(),
            scale = thumbnail.scale(),
            opacity = thumbnail.opacity(),
            reverse_wheel = thumbnail.reverse_wheel(),
            ?response,
            "Pointer event handled"
        );
        self.sweep();
        response
    }

    /// Every thumbnail mirroring `window` tears down
    pub fn handle_source_destroyed(&mut self, window: WindowId, now: Instant) {
        let mut ctx = context!(self, now);
        for thumbnail in self.thumbnails.iter_mut().filter(|t| t.source() == window) {
            info!(thumbnail = %thumbnail.id(), source = %window, "Source window destroyed");
            thumbnail.teardown(&mut ctx);
        }
        self.sweep();
    }

    pub fn handle_source_configured(&mut self, window: WindowId, dimensions: Dimensions) {
        for thumbnail in self.thumbnails.iter_mut().filter(|t| t.source() == window) {
            thumbnail.source_resized(dimensions);
        }
    }

    /// Run every timer whose deadline passed, including zero-delay timers
    /// scheduled by the timers run in this pass
    pub fn fire_due_timers(&mut self, now: Instant) {
        loop {
            let due = self.timers.take_due(now);
            if due.is_empty() {
                break;
            }
            for (timer, task) in due {
                self.run_timer(timer, task, now);
            }
        }
    }

    fn run_timer(&mut self, timer: TimerId, task: TimerTask, now: Instant) {
        match task {
            TimerTask::RestoreSnapBack(millis) => {
                debug!(millis, "Restoring snap-back duration");
                self.snap_back.set(millis);
            }
            TimerTask::ReleaseThrottle(id) => {
                if let Some(thumbnail) = self.thumbnails.iter_mut().find(|t| t.id() == id) {
                    thumbnail.release_throttle(timer);
                }
            }
            TimerTask::DragSettled { thumbnail: id, drop } => {
                if let Some(thumbnail) = self.thumbnails.iter_mut().find(|t| t.id() == id) {
                    thumbnail.end_drag(&mut context!(self, now), drop);
                }
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Tear down every thumbnail, e.g. on shutdown
    pub fn teardown_all(&mut self, now: Instant) {
        let mut ctx = context!(self, now);
        for thumbnail in &mut self.thumbnails {
            thumbnail.teardown(&mut ctx);
        }
        self.thumbnails.clear();
    }

    fn sweep(&mut self) {
        self.thumbnails.retain(|t| !t.is_torn_down());
    }

    pub fn len(&self) -> usize {
        self.thumbnails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty()
    }

    pub fn get(&self, id: OverlayId) -> Option<&Thumbnail<W::Overlay>> {
        self.thumbnails.iter().find(|t| t.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Thumbnail<W::Overlay>> {
        self.thumbnails.iter()
    }

    pub fn contains(&self, id: OverlayId) -> bool {
        self.get(id).is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn snap_back(&self) -> u32 {
        self.snap_back.get()
    }

    pub fn windows(&self) -> &W {
        &self.windows
    }

    pub fn windows_mut(&mut self) -> &mut W {
        &mut self.windows
    }
}
