//! Recording in-memory window system for unit tests

use anyhow::{Result, bail};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::common::types::{OverlayId, Position, WindowGeometry, WindowId};
use crate::config::Settings;

use super::backend::{Overlay, Subscription, TabEntry, WindowSystem};
use super::drag::SnapBackSetting;
use super::thumbnail::{Thumbnail, ThumbnailContext};
use super::timers::{TimerQueue, TimerTask};

#[derive(Debug)]
pub struct FakeOverlay {
    pub id: OverlayId,
    pub source: Option<WindowId>,
    pub scale: f64,
    pub scale_calls: usize,
    pub opacity: u8,
    pub position: Position,
    pub visible: bool,
    pub destroyed: bool,
    destroyed_log: Rc<RefCell<Vec<OverlayId>>>,
}

impl Overlay for FakeOverlay {
    fn id(&self) -> OverlayId {
        self.id
    }

    fn set_source(&mut self, source: Option<WindowId>) -> Result<()> {
        self.source = source;
        Ok(())
    }

    fn set_scale(&mut self, scale: f64) -> Result<()> {
        self.scale = scale;
        self.scale_calls += 1;
        Ok(())
    }

    fn set_opacity(&mut self, opacity: u8) -> Result<()> {
        self.opacity = opacity;
        Ok(())
    }

    fn set_position(&mut self, position: Position) -> Result<()> {
        self.position = position;
        Ok(())
    }

    fn position(&self) -> Position {
        self.position
    }

    fn show(&mut self) -> Result<()> {
        self.visible = true;
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        if !self.destroyed {
            self.destroyed = true;
            self.visible = false;
            self.destroyed_log.borrow_mut().push(self.id);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeDesktop {
    pub geometries: HashMap<WindowId, WindowGeometry>,
    pub tab: Vec<TabEntry>,
    pub activated: Vec<(WindowId, u32)>,
    pub close_requests: Vec<WindowId>,
    pub subscriptions: Vec<Subscription>,
    pub fail_subscribe: bool,
    next_subscription: u64,
    next_overlay: u32,
    destroyed_log: Rc<RefCell<Vec<OverlayId>>>,
}

impl FakeDesktop {
    /// Windows given as `(id, x, y, width, height)`, listed in tab order
    pub fn with_windows(windows: &[(u32, i16, i16, u16, u16)]) -> Self {
        let mut desktop = Self::default();
        for &(id, x, y, width, height) in windows {
            desktop
                .geometries
                .insert(WindowId(id), WindowGeometry::new(x, y, width, height));
            desktop.tab.push(TabEntry {
                window: WindowId(id),
                normal: true,
                minimized: false,
                skip_taskbar: false,
            });
        }
        desktop
    }

    /// Forget a window, as if the application closed it
    pub fn remove_window(&mut self, window: WindowId) {
        self.geometries.remove(&window);
        self.tab.retain(|entry| entry.window != window);
    }

    pub fn active_subscriptions(&self) -> Vec<WindowId> {
        self.subscriptions.iter().map(|s| s.window).collect()
    }

    pub fn destroyed_overlays(&self) -> Vec<OverlayId> {
        self.destroyed_log.borrow().clone()
    }
}

impl WindowSystem for FakeDesktop {
    type Overlay = FakeOverlay;

    fn create_overlay(
        &mut self,
        source: WindowId,
        position: Position,
        scale: f64,
    ) -> Result<FakeOverlay> {
        self.next_overlay += 1;
        Ok(FakeOverlay {
            id: OverlayId(0x100 + self.next_overlay),
            source: Some(source),
            scale,
            scale_calls: 0,
            opacity: 255,
            position,
            visible: false,
            destroyed: false,
            destroyed_log: Rc::clone(&self.destroyed_log),
        })
    }

    fn geometry(&self, window: WindowId) -> Result<WindowGeometry> {
        match self.geometries.get(&window) {
            Some(geometry) => Ok(*geometry),
            None => bail!("no such window {}", window),
        }
    }

    fn tab_list(&self) -> Result<Vec<TabEntry>> {
        Ok(self.tab.clone())
    }

    fn activate(&mut self, window: WindowId, time: u32) -> Result<()> {
        self.activated.push((window, time));
        Ok(())
    }

    fn request_close(&mut self, window: WindowId, _time: u32) -> Result<()> {
        self.close_requests.push(window);
        Ok(())
    }

    fn subscribe_destroy(&mut self, window: WindowId) -> Result<Subscription> {
        if self.fail_subscribe {
            bail!("subscription refused");
        }
        self.next_subscription += 1;
        let subscription = Subscription {
            id: self.next_subscription,
            window,
        };
        self.subscriptions.push(subscription);
        Ok(subscription)
    }

    fn unsubscribe_destroy(&mut self, subscription: Subscription) -> Result<()> {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| *s != subscription);
        if before == self.subscriptions.len() {
            bail!("unknown subscription {}", subscription.id);
        }
        Ok(())
    }
}

/// Owner-side state a single thumbnail borrows in tests
pub struct Harness {
    pub desktop: FakeDesktop,
    pub timers: TimerQueue,
    pub snap_back: SnapBackSetting,
    pub settings: Settings,
    pub now: Instant,
}

impl Harness {
    pub fn new(desktop: FakeDesktop) -> Self {
        let settings = Settings::default();
        Self {
            desktop,
            timers: TimerQueue::new(),
            snap_back: SnapBackSetting::new(settings.snap_back_animation_ms),
            settings,
            now: Instant::now(),
        }
    }

    pub fn ctx(&mut self) -> ThumbnailContext<'_, FakeDesktop> {
        ThumbnailContext {
            windows: &mut self.desktop,
            timers: &mut self.timers,
            snap_back: &self.snap_back,
            settings: &self.settings,
            now: self.now,
        }
    }

    /// Fire every pending throttle timer of `thumbnail`, leaving other timers queued
    pub fn release_throttles(&mut self, thumbnail: &mut Thumbnail<FakeOverlay>) {
        let horizon = self.now + Duration::from_secs(60);
        for (id, task) in self.timers.take_due(horizon) {
            match task {
                TimerTask::ReleaseThrottle(owner) if owner == thumbnail.id() => {
                    thumbnail.release_throttle(id);
                }
                other => {
                    self.timers.schedule(self.now, Duration::ZERO, other);
                }
            }
        }
    }
}
