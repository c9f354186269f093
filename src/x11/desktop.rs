//! `WindowSystem` over a live X server

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use tracing::{debug, trace};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::common::types::{Position, WindowGeometry, WindowId};
use crate::daemon::{Subscription, TabEntry, WindowSystem};

use super::overlay::X11Overlay;
use super::{AppContext, window};

/// Reference counts of STRUCTURE_NOTIFY selections on source windows.
///
/// X11 keeps one event mask per client and window, so several thumbnails
/// watching the same source share a single selection.
#[derive(Debug, Default)]
pub struct DestroyWatch {
    counts: HashMap<Window, usize>,
}

impl DestroyWatch {
    /// Returns true when this is the first watcher of `window`
    pub fn acquire(&mut self, window: Window) -> bool {
        let count = self.counts.entry(window).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Returns true when the last watcher of `window` left
    pub fn release(&mut self, window: Window) -> bool {
        match self.counts.get_mut(&window) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.counts.remove(&window);
                true
            }
            None => false,
        }
    }

    pub fn is_watched(&self, window: Window) -> bool {
        self.counts.contains_key(&window)
    }
}

pub struct X11Desktop<'a> {
    ctx: AppContext<'a>,
    watch: DestroyWatch,
    next_subscription: u64,
}

impl<'a> X11Desktop<'a> {
    pub fn new(ctx: AppContext<'a>) -> Self {
        Self {
            ctx,
            watch: DestroyWatch::default(),
            next_subscription: 0,
        }
    }

    pub fn context(&self) -> &AppContext<'a> {
        &self.ctx
    }

    pub fn is_watched(&self, window: WindowId) -> bool {
        self.watch.is_watched(window.0)
    }

    fn select_structure_events(&self, window: Window, mask: EventMask) -> Result<()> {
        self.ctx
            .conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))
            .with_context(|| format!("Failed to change event mask of window {}", window))?;
        self.ctx
            .conn
            .flush()
            .context("Failed to flush X11 connection after event mask change")?;
        Ok(())
    }
}

impl<'a> WindowSystem for X11Desktop<'a> {
    type Overlay = X11Overlay<'a>;

    fn create_overlay(
        &mut self,
        source: WindowId,
        position: Position,
        scale: f64,
    ) -> Result<X11Overlay<'a>> {
        X11Overlay::new(self.ctx, source, position, scale)
    }

    fn geometry(&self, window: WindowId) -> Result<WindowGeometry> {
        window::window_geometry(&self.ctx, window.0)
    }

    fn tab_list(&self) -> Result<Vec<TabEntry>> {
        window::tab_order(&self.ctx)
    }

    fn activate(&mut self, window: WindowId, time: u32) -> Result<()> {
        window::activate_window(&self.ctx, window.0, time)
    }

    fn request_close(&mut self, window: WindowId, time: u32) -> Result<()> {
        window::close_window(&self.ctx, window.0, time)
    }

    fn subscribe_destroy(&mut self, window: WindowId) -> Result<Subscription> {
        if self.watch.acquire(window.0)
            && let Err(e) = self.select_structure_events(window.0, EventMask::STRUCTURE_NOTIFY)
        {
            self.watch.release(window.0);
            return Err(e);
        }

        self.next_subscription += 1;
        trace!(window = %window, subscription = self.next_subscription, "Watching window for destruction");
        Ok(Subscription {
            id: self.next_subscription,
            window,
        })
    }

    fn unsubscribe_destroy(&mut self, subscription: Subscription) -> Result<()> {
        let window = subscription.window;
        if !self.watch.is_watched(window.0) {
            bail!("Window {} is not being watched", window);
        }
        if self.watch.release(window.0) {
            debug!(window = %window, "No thumbnail watches window anymore");
            self.select_structure_events(window.0, EventMask::NO_EVENT)?;
        }
        Ok(())
    }
}
