//! Live window thumbnail
//!
//! One `Thumbnail` mirrors one source window through an [`Overlay`]. It decodes
//! pointer and scroll gestures into scale, opacity, position and source changes,
//! and tears itself down when dismissed or when its source disappears.
//!
//! State transitions:
//!
//! | from      | event                              | to        |
//! |-----------|------------------------------------|-----------|
//! | Active    | accepted wheel up/down             | Throttled |
//! | Throttled | throttle timer fired               | Active    |
//! | Throttled | wheel up/down                      | Throttled (dropped) |
//! | Active    | primary press + motion > threshold | Dragging  |
//! | Dragging  | primary release / cancel           | Active    |
//! | any       | secondary release, source destroyed| TornDown  |

use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::common::types::{
    Button, Dimensions, EventResponse, Modifiers, OverlayId, PointerEvent, Position,
    ScrollDirection, WindowId,
};
use crate::config::Settings;
use crate::constants::thumbnail::{
    MAX_OPACITY, MAX_SCALE, MIN_OPACITY, MIN_SCALE, REDRAW_NUDGE,
};

use super::backend::{Overlay, Subscription, WindowSystem};
use super::cycle::{self, CycleDirection};
use super::drag::{DragMotion, DragRelease, DragTracker, SnapBackSetting};
use super::gesture::{self, ReleaseAction, ScrollAction};
use super::throttle::ActionThrottle;
use super::timers::{TimerId, TimerQueue, TimerTask};

/// Everything a thumbnail borrows from its owner while handling one event
pub struct ThumbnailContext<'a, W: WindowSystem> {
    pub windows: &'a mut W,
    pub timers: &'a mut TimerQueue,
    pub snap_back: &'a SnapBackSetting,
    pub settings: &'a Settings,
    pub now: Instant,
}

/// Externally observable state of a thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailState {
    Active,
    /// Scroll actions are gated until the throttle timer fires
    Throttled,
    Dragging,
    TornDown,
}

pub fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

pub fn clamp_opacity(opacity: i16) -> u8 {
    opacity.clamp(MIN_OPACITY as i16, MAX_OPACITY as i16) as u8
}

/// Scale that makes a `native_width` wide window `target_width` wide, never above 1.0
pub fn initial_scale(target_width: u16, native_width: u16) -> f64 {
    if native_width == 0 {
        return MAX_SCALE;
    }
    clamp_scale((target_width as f64 / native_width as f64).min(MAX_SCALE))
}

#[derive(Debug)]
pub struct Thumbnail<O: Overlay> {
    // === Source binding ===
    source: WindowId,
    source_size: Dimensions,
    destroy_subscription: Option<Subscription>,

    // === Visual state ===
    scale: f64,
    opacity: u8,
    reverse_wheel: bool,
    redraw_parity: bool,

    // === Input state ===
    throttle: ActionThrottle,
    drag: DragTracker,
    /// Snap-back duration in effect when this thumbnail was created
    saved_snap_back: u32,
    torn_down: bool,

    overlay: O,
}

impl<O: Overlay> Thumbnail<O> {
    /// Creates a thumbnail for `source` and shows it.
    ///
    /// The overlay spawns `spawn_offset` pixels right of and below the source's
    /// top-left corner, scaled so it is `initial_width` wide.
    pub fn new<W>(ctx: &mut ThumbnailContext<'_, W>, source: WindowId) -> Result<Self>
    where
        W: WindowSystem<Overlay = O>,
    {
        let geometry = ctx
            .windows
            .geometry(source)
            .with_context(|| format!("Failed to query geometry of source window {}", source))?;

        let scale = initial_scale(ctx.settings.initial_width, geometry.dimensions.width);
        let offset = ctx.settings.spawn_offset;
        let spawn = geometry.position.offset(offset, offset);

        info!(
            source = %source,
            x = spawn.x,
            y = spawn.y,
            width = geometry.dimensions.width,
            height = geometry.dimensions.height,
            scale = scale,
            "Creating thumbnail"
        );

        let mut overlay = ctx
            .windows
            .create_overlay(source, spawn, scale)
            .with_context(|| format!("Failed to create overlay for source window {}", source))?;

        let subscription = match ctx.windows.subscribe_destroy(source) {
            Ok(subscription) => subscription,
            Err(e) => {
                if let Err(cleanup) = overlay.destroy() {
                    warn!(error = %cleanup, "Failed to destroy overlay after subscription failure");
                }
                return Err(e.context(format!(
                    "Failed to watch source window {} for destruction",
                    source
                )));
            }
        };

        let mut thumbnail = Self {
            source,
            source_size: geometry.dimensions,
            destroy_subscription: Some(subscription),
            scale,
            opacity: ctx.settings.initial_opacity,
            reverse_wheel: false,
            redraw_parity: false,
            throttle: ActionThrottle::new(),
            drag: DragTracker::new(),
            saved_snap_back: ctx.snap_back.get(),
            torn_down: false,
            overlay,
        };

        thumbnail.push_opacity();
        // The construction-time nudge is superseded by the final placement below,
        // the first real resize then nudges downwards.
        thumbnail.apply_scale();
        thumbnail.move_to(spawn);
        thumbnail.redraw_parity = true;

        if let Err(e) = thumbnail.overlay.show() {
            warn!(thumbnail = %thumbnail.id(), error = %e, "Failed to show overlay");
        }

        Ok(thumbnail)
    }

    // Accessors

    pub fn id(&self) -> OverlayId {
        self.overlay.id()
    }

    pub fn source(&self) -> WindowId {
        self.source
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn position(&self) -> Position {
        self.overlay.position()
    }

    pub fn reverse_wheel(&self) -> bool {
        self.reverse_wheel
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// On-screen height of the mirrored content
    pub fn displayed_height(&self) -> f64 {
        self.source_size.height as f64 * self.scale
    }

    pub fn state(&self) -> ThumbnailState {
        if self.torn_down {
            ThumbnailState::TornDown
        } else if self.drag.is_dragging() {
            ThumbnailState::Dragging
        } else if self.throttle.is_armed() {
            ThumbnailState::Throttled
        } else {
            ThumbnailState::Active
        }
    }

    /// Dispatch one pointer event. Torn-down thumbnails let everything through.
    pub fn handle_pointer<W>(
        &mut self,
        ctx: &mut ThumbnailContext<'_, W>,
        event: PointerEvent,
    ) -> EventResponse
    where
        W: WindowSystem<Overlay = O>,
    {
        if self.torn_down {
            return EventResponse::Propagate;
        }

        match event {
            PointerEvent::Press {
                button,
                click_count,
                root,
                time,
            } => self.on_press(ctx, button, click_count, root, time),
            PointerEvent::Release { button, root, time } => {
                self.on_release(ctx, button, root, time)
            }
            PointerEvent::Motion { root } => self.on_motion(ctx, root),
            PointerEvent::Scroll {
                direction,
                modifiers,
            } => self.on_scroll(ctx, direction, modifiers),
        }
    }

    fn on_press<W>(
        &mut self,
        ctx: &mut ThumbnailContext<'_, W>,
        button: Button,
        click_count: u8,
        root: Position,
        time: u32,
    ) -> EventResponse
    where
        W: WindowSystem<Overlay = O>,
    {
        if button != Button::Primary
            && let Some(drop) = self.drag.cancel(button)
        {
            debug!(thumbnail = %self.id(), ?button, "Drag cancelled");
            self.end_drag(ctx, drop);
            // The snap-back duration is read after the drag-end handler ran
            let settle = Duration::from_millis(ctx.snap_back.get() as u64);
            ctx.timers.schedule(
                ctx.now,
                settle,
                TimerTask::DragSettled {
                    thumbnail: self.id(),
                    drop,
                },
            );
            return EventResponse::Stop;
        }

        if gesture::is_activation(button, click_count) {
            debug!(thumbnail = %self.id(), source = %self.source, "Double click, activating source");
            if let Err(e) = ctx.windows.activate(self.source, time) {
                warn!(source = %self.source, error = %e, "Failed to activate source window");
            }
        }

        if button == Button::Primary {
            self.drag.press(root, self.overlay.position());
        }

        EventResponse::Propagate
    }

    fn on_release<W>(
        &mut self,
        ctx: &mut ThumbnailContext<'_, W>,
        button: Button,
        root: Position,
        time: u32,
    ) -> EventResponse
    where
        W: WindowSystem<Overlay = O>,
    {
        match self.drag.release(button, root) {
            DragRelease::Dropped(drop) => {
                self.end_drag(ctx, drop);
                return EventResponse::Stop;
            }
            DragRelease::Swallowed => return EventResponse::Stop,
            DragRelease::Click => {}
        }

        // Click actions run but leave the release to other handlers
        match gesture::decode_release(button) {
            ReleaseAction::ToggleWheelMode => {
                self.reverse_wheel = !self.reverse_wheel;
                debug!(thumbnail = %self.id(), reverse_wheel = self.reverse_wheel, "Toggled wheel mode");
            }
            ReleaseAction::Dismiss => {
                info!(thumbnail = %self.id(), "Thumbnail dismissed");
                self.teardown(ctx);
            }
            ReleaseAction::CloseSource => {
                info!(source = %self.source, "Requesting source window to close");
                if let Err(e) = ctx.windows.request_close(self.source, time) {
                    warn!(source = %self.source, error = %e, "Failed to request window close");
                }
            }
            ReleaseAction::Ignore => {}
        }
        EventResponse::Propagate
    }

    fn on_motion<W>(&mut self, ctx: &mut ThumbnailContext<'_, W>, root: Position) -> EventResponse
    where
        W: WindowSystem<Overlay = O>,
    {
        let was_dragging = self.drag.is_dragging();
        match self.drag.motion(root, ctx.settings.drag_threshold) {
            DragMotion::Moved(position) => {
                if !was_dragging {
                    debug!(thumbnail = %self.id(), "Drag started");
                    if let Err(e) = self.overlay.set_opacity(ctx.settings.drag_opacity) {
                        warn!(thumbnail = %self.id(), error = %e, "Failed to dim overlay for drag");
                    }
                }
                self.move_to(position);
                EventResponse::Stop
            }
            DragMotion::Ignored => EventResponse::Propagate,
        }
    }

    fn on_scroll<W>(
        &mut self,
        ctx: &mut ThumbnailContext<'_, W>,
        direction: ScrollDirection,
        modifiers: Modifiers,
    ) -> EventResponse
    where
        W: WindowSystem<Overlay = O>,
    {
        if !gesture::is_actionable(direction) || self.drag.is_dragging() {
            return EventResponse::Propagate;
        }

        let base = ctx.settings.action_timeout();
        if !self
            .throttle
            .try_acquire(ctx.timers, ctx.now, self.id(), base, self.reverse_wheel)
        {
            return EventResponse::Propagate;
        }

        let Some(action) = gesture::decode_scroll(direction, modifiers, self.reverse_wheel) else {
            return EventResponse::Propagate;
        };

        match action {
            ScrollAction::AdjustOpacity(delta) => {
                self.opacity = clamp_opacity(self.opacity as i16 + delta);
                debug!(thumbnail = %self.id(), opacity = self.opacity, "Opacity changed");
                self.push_opacity();
            }
            ScrollAction::Cycle(direction) => {
                self.cycle_source(ctx, direction);
            }
            ScrollAction::Resize(delta) => {
                self.scale = clamp_scale(self.scale + delta);
                debug!(thumbnail = %self.id(), scale = self.scale, "Scale changed");
            }
        }

        self.apply_scale();
        EventResponse::Stop
    }

    /// Mirror the neighbour of the current source in tab order.
    /// Returns false (and changes nothing) when no neighbour could be resolved.
    pub fn cycle_source<W>(
        &mut self,
        ctx: &mut ThumbnailContext<'_, W>,
        direction: CycleDirection,
    ) -> bool
    where
        W: WindowSystem<Overlay = O>,
    {
        let tab_list = match ctx.windows.tab_list() {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Failed to read tab order");
                return false;
            }
        };

        let windows = cycle::switchable_windows(&tab_list);
        match cycle::neighbour(&windows, self.source, direction) {
            Some(next) => self.rebind(ctx, next),
            None => false,
        }
    }

    /// Switch the mirrored window, keeping the on-screen height
    fn rebind<W>(&mut self, ctx: &mut ThumbnailContext<'_, W>, next: WindowId) -> bool
    where
        W: WindowSystem<Overlay = O>,
    {
        let next_geometry = match ctx.windows.geometry(next) {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!(window = %next, error = %e, "Failed to query geometry of next source");
                return false;
            }
        };

        let old_height = ctx
            .windows
            .geometry(self.source)
            .map(|geometry| geometry.dimensions.height)
            .unwrap_or(self.source_size.height);

        if let Some(old) = self.destroy_subscription.take()
            && let Err(e) = ctx.windows.unsubscribe_destroy(old)
        {
            warn!(window = %old.window, error = %e, "Failed to unwatch previous source");
        }

        if let Err(e) = self.overlay.set_source(Some(next)) {
            warn!(window = %next, error = %e, "Failed to bind overlay to next source");
        }

        match ctx.windows.subscribe_destroy(next) {
            Ok(subscription) => self.destroy_subscription = Some(subscription),
            Err(e) => warn!(window = %next, error = %e, "Failed to watch next source for destruction"),
        }

        let new_height = next_geometry.dimensions.height;
        if new_height > 0 {
            self.scale = clamp_scale(self.scale * old_height as f64 / new_height as f64);
        }

        info!(
            thumbnail = %self.id(),
            from = %self.source,
            to = %next,
            scale = self.scale,
            "Switched thumbnail source"
        );

        self.source = next;
        self.source_size = next_geometry.dimensions;
        self.apply_scale();
        true
    }

    /// Push the scale to the overlay and nudge the position by one pixel,
    /// alternating direction, so the reactive area follows the new size.
    fn apply_scale(&mut self) {
        if let Err(e) = self.overlay.set_scale(self.scale) {
            warn!(thumbnail = %self.id(), error = %e, "Failed to apply scale");
        }

        let nudge = if self.redraw_parity {
            REDRAW_NUDGE
        } else {
            -REDRAW_NUDGE
        };
        let position = self.overlay.position().offset(0, nudge);
        self.move_to(position);
        self.redraw_parity = !self.redraw_parity;
    }

    fn push_opacity(&mut self) {
        if let Err(e) = self.overlay.set_opacity(self.opacity) {
            warn!(thumbnail = %self.id(), error = %e, "Failed to apply opacity");
        }
    }

    fn move_to(&mut self, position: Position) {
        if let Err(e) = self.overlay.set_position(position) {
            warn!(thumbnail = %self.id(), error = %e, "Failed to move overlay");
        }
    }

    /// Drop handler shared by finished and cancelled drags.
    ///
    /// Zeroes the shared snap-back duration so the drop lands instantly, then
    /// defers writing back the value captured at construction.
    pub fn end_drag<W>(&mut self, ctx: &mut ThumbnailContext<'_, W>, drop: Position)
    where
        W: WindowSystem<Overlay = O>,
    {
        if self.torn_down {
            return;
        }

        debug!(thumbnail = %self.id(), x = drop.x, y = drop.y, "Drag ended");
        self.move_to(drop);
        self.push_opacity();
        ctx.snap_back.set(0);
        ctx.timers.schedule(
            ctx.now,
            Duration::ZERO,
            TimerTask::RestoreSnapBack(self.saved_snap_back),
        );
    }

    /// Throttle timer callback
    pub fn release_throttle(&mut self, fired: TimerId) {
        if self.throttle.release(fired) {
            debug!(thumbnail = %self.id(), "Scroll actions accepted again");
        }
    }

    /// The source changed size; keep the overlay at the current scale of the new size
    pub fn source_resized(&mut self, dimensions: Dimensions) {
        if self.torn_down || self.source_size == dimensions {
            return;
        }
        self.source_size = dimensions;
        if let Err(e) = self.overlay.set_scale(self.scale) {
            warn!(thumbnail = %self.id(), error = %e, "Failed to follow source resize");
        }
    }

    /// Release the subscription, the mirrored surface, pending timers and the overlay.
    /// Returns false when the thumbnail was already torn down.
    pub fn teardown<W>(&mut self, ctx: &mut ThumbnailContext<'_, W>) -> bool
    where
        W: WindowSystem<Overlay = O>,
    {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;

        if let Some(subscription) = self.destroy_subscription.take()
            && let Err(e) = ctx.windows.unsubscribe_destroy(subscription)
        {
            debug!(window = %subscription.window, error = %e, "Failed to unwatch source during teardown");
        }

        if let Err(e) = self.overlay.set_source(None) {
            debug!(thumbnail = %self.id(), error = %e, "Failed to detach source during teardown");
        }

        self.throttle.cancel(ctx.timers);

        if let Err(e) = self.overlay.destroy() {
            warn!(thumbnail = %self.id(), error = %e, "Failed to destroy overlay");
        }

        info!(thumbnail = %self.id(), source = %self.source, "Thumbnail torn down");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::testing::{FakeDesktop, Harness};

    fn press(button: Button, click_count: u8, x: i16, y: i16) -> PointerEvent {
        PointerEvent::Press {
            button,
            click_count,
            root: Position::new(x, y),
            time: 42,
        }
    }

    fn release(button: Button, x: i16, y: i16) -> PointerEvent {
        PointerEvent::Release {
            button,
            root: Position::new(x, y),
            time: 43,
        }
    }

    fn scroll(direction: ScrollDirection, modifiers: Modifiers) -> PointerEvent {
        PointerEvent::Scroll {
            direction,
            modifiers,
        }
    }

    fn open(h: &mut Harness, window: u32) -> Thumbnail<crate::daemon::testing::FakeOverlay> {
        Thumbnail::new(&mut h.ctx(), WindowId(window)).unwrap()
    }

    #[test]
    fn test_initial_scale_formula() {
        assert!((initial_scale(300, 800) - 0.375).abs() < 1e-9);
        assert_eq!(initial_scale(300, 200), 1.0);
        assert_eq!(initial_scale(300, 0), 1.0);
        // Very wide windows still respect the lower bound
        assert_eq!(initial_scale(300, 6000), MIN_SCALE);
    }

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_scale(1.5), 1.0);
        assert_eq!(clamp_scale(0.01), 0.1);
        assert_eq!(clamp_opacity(300), 255);
        assert_eq!(clamp_opacity(10), 48);
    }

    #[test]
    fn test_construction() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 100, 50, 800, 600)]));
        let thumb = open(&mut h, 1);

        assert!((thumb.scale() - 0.375).abs() < 1e-9);
        assert_eq!(thumb.position(), Position::new(102, 52));
        assert_eq!(thumb.opacity(), 255);
        assert_eq!(thumb.state(), ThumbnailState::Active);
        assert!(thumb.overlay().visible);
        assert_eq!(thumb.overlay().source, Some(WindowId(1)));
        assert_eq!(h.desktop.active_subscriptions(), vec![WindowId(1)]);
    }

    #[test]
    fn test_construction_fails_for_unknown_window() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[]));
        assert!(Thumbnail::new(&mut h.ctx(), WindowId(9)).is_err());
    }

    #[test]
    fn test_construction_cleans_up_when_subscription_fails() {
        let mut desktop = FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]);
        desktop.fail_subscribe = true;
        let mut h = Harness::new(desktop);

        assert!(Thumbnail::new(&mut h.ctx(), WindowId(1)).is_err());
        assert_eq!(h.desktop.destroyed_overlays().len(), 1);
    }

    #[test]
    fn test_double_click_activates_source() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), press(Button::Primary, 1, 5, 5));
        assert!(h.desktop.activated.is_empty());
        thumb.handle_pointer(&mut h.ctx(), press(Button::Primary, 2, 5, 5));
        assert_eq!(h.desktop.activated, vec![(WindowId(1), 42)]);
    }

    #[test]
    fn test_primary_release_toggles_wheel_mode() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        assert_eq!(thumb.handle_pointer(&mut h.ctx(), release(Button::Primary, 5, 5)), EventResponse::Propagate);
        assert!(thumb.reverse_wheel());
        thumb.handle_pointer(&mut h.ctx(), release(Button::Primary, 5, 5));
        assert!(!thumb.reverse_wheel());
    }

    #[test]
    fn test_middle_release_requests_close() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), release(Button::Middle, 5, 5));
        assert_eq!(h.desktop.close_requests, vec![WindowId(1)]);
        assert!(!thumb.is_torn_down());
    }

    #[test]
    fn test_other_buttons_propagate() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        let response = thumb.handle_pointer(&mut h.ctx(), release(Button::Other(8), 5, 5));
        assert_eq!(response, EventResponse::Propagate);
    }

    #[test]
    fn test_secondary_release_tears_down() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), release(Button::Secondary, 5, 5));
        assert!(thumb.is_torn_down());
        assert_eq!(thumb.state(), ThumbnailState::TornDown);
        assert!(thumb.overlay().destroyed);
        assert_eq!(thumb.overlay().source, None);
        assert!(h.desktop.active_subscriptions().is_empty());
    }

    #[test]
    fn test_torn_down_ignores_gestures() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);
        assert!(thumb.teardown(&mut h.ctx()));

        let response = thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Up, Modifiers::SHIFT));
        assert_eq!(response, EventResponse::Propagate);
        assert_eq!(thumb.opacity(), 255);
        thumb.handle_pointer(&mut h.ctx(), release(Button::Primary, 0, 0));
        assert!(!thumb.reverse_wheel());
    }

    #[test]
    fn test_teardown_twice_is_noop() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        assert!(thumb.teardown(&mut h.ctx()));
        assert!(!thumb.teardown(&mut h.ctx()));
        assert_eq!(h.desktop.destroyed_overlays(), vec![thumb.id()]);
    }

    #[test]
    fn test_teardown_cancels_throttle_timer() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::NONE));
        assert_eq!(thumb.state(), ThumbnailState::Throttled);
        thumb.teardown(&mut h.ctx());
        assert!(h.timers.is_empty());
    }

    #[test]
    fn test_shift_scroll_up_caps_opacity() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        h.settings.initial_opacity = 231;
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Up, Modifiers::SHIFT));
        assert_eq!(thumb.opacity(), 255);
        assert_eq!(thumb.overlay().opacity, 255);
    }

    #[test]
    fn test_shift_scroll_changes_opacity_by_step() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        h.settings.initial_opacity = 200;
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Up, Modifiers::SHIFT));
        assert_eq!(thumb.opacity(), 224);
        h.release_throttles(&mut thumb);
        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::SHIFT));
        assert_eq!(thumb.opacity(), 200);
    }

    #[test]
    fn test_opacity_stays_in_range() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        for step in 0..40 {
            let direction = if step % 13 < 9 {
                ScrollDirection::Down
            } else {
                ScrollDirection::Up
            };
            thumb.handle_pointer(&mut h.ctx(), scroll(direction, Modifiers::SHIFT));
            h.release_throttles(&mut thumb);
            assert!((MIN_OPACITY..=MAX_OPACITY).contains(&thumb.opacity()));
        }
    }

    #[test]
    fn test_scale_stays_in_range() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        for _ in 0..50 {
            thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::NONE));
            h.release_throttles(&mut thumb);
        }
        assert_eq!(thumb.scale(), MAX_SCALE);

        for _ in 0..50 {
            thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Up, Modifiers::NONE));
            h.release_throttles(&mut thumb);
            assert!(thumb.scale() >= MIN_SCALE && thumb.scale() <= MAX_SCALE);
        }
        assert_eq!(thumb.scale(), MIN_SCALE);
    }

    #[test]
    fn test_redraw_nudge_alternates() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);
        let start = thumb.position();

        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::NONE));
        let first = thumb.position();
        h.release_throttles(&mut thumb);
        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::NONE));
        let second = thumb.position();
        h.release_throttles(&mut thumb);
        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::NONE));
        let third = thumb.position();

        assert_eq!(first.y - start.y, 1);
        assert_eq!(second.y - first.y, -1);
        assert_eq!(third.y - second.y, 1);
        assert_eq!(first.x, start.x);
    }

    #[test]
    fn test_throttled_scroll_is_dropped() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);
        let initial = thumb.scale();

        let handled = thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::NONE));
        let response = thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::NONE));

        assert_eq!(handled, EventResponse::Stop);
        assert_eq!(response, EventResponse::Propagate);
        assert!((thumb.scale() - (initial + 0.025)).abs() < 1e-9);
    }

    #[test]
    fn test_sideways_scroll_propagates_without_arming() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        let response = thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Left, Modifiers::NONE));
        assert_eq!(response, EventResponse::Propagate);
        assert_eq!(thumb.state(), ThumbnailState::Active);
        assert!(h.timers.is_empty());
    }

    #[test]
    fn test_cycle_preserves_height() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[
            (1, 0, 0, 800, 600),
            (2, 0, 0, 1000, 900),
            (3, 0, 0, 640, 400),
        ]));
        let mut thumb = open(&mut h, 1);
        let before = thumb.displayed_height();

        // ctrl flips the wheel into cycling while reverse mode is off
        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::CTRL));

        assert_eq!(thumb.source(), WindowId(2));
        assert_eq!(thumb.overlay().source, Some(WindowId(2)));
        assert!((thumb.displayed_height() - before).abs() < 1e-9);
        assert_eq!(h.desktop.active_subscriptions(), vec![WindowId(2)]);
    }

    #[test]
    fn test_cycle_up_goes_to_previous_and_wraps() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[
            (1, 0, 0, 800, 600),
            (2, 0, 0, 800, 600),
            (3, 0, 0, 800, 600),
        ]));
        let mut thumb = open(&mut h, 1);
        thumb.handle_pointer(&mut h.ctx(), release(Button::Primary, 0, 0));

        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Up, Modifiers::NONE));
        assert_eq!(thumb.source(), WindowId(3));
    }

    #[test]
    fn test_cycle_skips_hidden_windows() {
        let mut desktop = FakeDesktop::with_windows(&[
            (1, 0, 0, 800, 600),
            (2, 0, 0, 800, 600),
            (3, 0, 0, 800, 600),
        ]);
        desktop.tab[1].minimized = true;
        let mut h = Harness::new(desktop);
        let mut thumb = open(&mut h, 1);

        assert!(thumb.cycle_source(&mut h.ctx(), CycleDirection::Next));
        assert_eq!(thumb.source(), WindowId(3));
    }

    #[test]
    fn test_cycle_from_unlisted_source_is_noop() {
        let mut desktop = FakeDesktop::with_windows(&[(1, 0, 0, 800, 600), (2, 0, 0, 800, 600)]);
        desktop.tab[0].skip_taskbar = true;
        let mut h = Harness::new(desktop);
        let mut thumb = open(&mut h, 1);
        let scale = thumb.scale();

        assert!(!thumb.cycle_source(&mut h.ctx(), CycleDirection::Next));
        assert_eq!(thumb.source(), WindowId(1));
        assert_eq!(thumb.scale(), scale);
        assert_eq!(h.desktop.active_subscriptions(), vec![WindowId(1)]);
    }

    #[test]
    fn test_cycle_single_window_rebinds_itself() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);
        let scale = thumb.scale();

        assert!(thumb.cycle_source(&mut h.ctx(), CycleDirection::Next));
        assert_eq!(thumb.source(), WindowId(1));
        assert!((thumb.scale() - scale).abs() < 1e-9);
        assert_eq!(h.desktop.active_subscriptions(), vec![WindowId(1)]);
    }

    #[test]
    fn test_drag_moves_overlay_and_restores_snap_back() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 100, 100, 800, 600)]));
        let mut thumb = open(&mut h, 1);
        assert_eq!(thumb.position(), Position::new(102, 102));

        thumb.handle_pointer(&mut h.ctx(), press(Button::Primary, 1, 110, 110));
        thumb.handle_pointer(&mut h.ctx(), PointerEvent::Motion { root: Position::new(150, 130) });
        assert_eq!(thumb.state(), ThumbnailState::Dragging);
        assert_eq!(thumb.position(), Position::new(142, 122));

        let response = thumb.handle_pointer(&mut h.ctx(), release(Button::Primary, 160, 140));
        assert_eq!(response, EventResponse::Stop);
        assert_eq!(thumb.position(), Position::new(152, 132));
        // Drop does not toggle the wheel mode
        assert!(!thumb.reverse_wheel());
        assert_eq!(h.snap_back.get(), 0);

        let due = h.timers.take_due(h.now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1, TimerTask::RestoreSnapBack(250));
    }

    #[test]
    fn test_drag_cancel_settles_immediately() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), press(Button::Primary, 1, 10, 10));
        thumb.handle_pointer(&mut h.ctx(), PointerEvent::Motion { root: Position::new(60, 10) });
        thumb.handle_pointer(&mut h.ctx(), press(Button::Secondary, 1, 60, 10));

        let drop = Position::new(52, 2);
        assert_eq!(thumb.position(), drop);
        assert_eq!(thumb.state(), ThumbnailState::Active);

        let tasks: Vec<_> = h.timers.take_due(h.now).into_iter().map(|(_, task)| task).collect();
        assert!(tasks.contains(&TimerTask::RestoreSnapBack(250)));
        assert!(tasks.contains(&TimerTask::DragSettled { thumbnail: thumb.id(), drop }));

        // The secondary release of the cancel gesture must not dismiss
        thumb.handle_pointer(&mut h.ctx(), release(Button::Secondary, 60, 10));
        assert!(!thumb.is_torn_down());
    }

    #[test]
    fn test_source_resize_reapplies_scale() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);
        let calls = thumb.overlay().scale_calls;

        thumb.source_resized(Dimensions::new(1024, 768));
        assert_eq!(thumb.overlay().scale_calls, calls + 1);
        assert!((thumb.displayed_height() - 768.0 * thumb.scale()).abs() < 1e-9);
    }

    #[test]
    fn test_drag_dims_overlay_until_drop() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        h.settings.initial_opacity = 240;
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), press(Button::Primary, 1, 10, 10));
        // Below the threshold nothing changes yet
        thumb.handle_pointer(&mut h.ctx(), PointerEvent::Motion { root: Position::new(12, 10) });
        assert_eq!(thumb.overlay().opacity, 240);

        thumb.handle_pointer(&mut h.ctx(), PointerEvent::Motion { root: Position::new(60, 10) });
        assert_eq!(thumb.state(), ThumbnailState::Dragging);
        assert_eq!(thumb.overlay().opacity, 200);
        assert_eq!(thumb.opacity(), 240);

        thumb.handle_pointer(&mut h.ctx(), release(Button::Primary, 70, 10));
        assert_eq!(thumb.overlay().opacity, 240);
    }

    #[test]
    fn test_cancelled_drag_restores_opacity() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), press(Button::Primary, 1, 10, 10));
        thumb.handle_pointer(&mut h.ctx(), PointerEvent::Motion { root: Position::new(60, 10) });
        assert_eq!(thumb.overlay().opacity, 200);

        thumb.handle_pointer(&mut h.ctx(), press(Button::Secondary, 1, 60, 10));
        assert_eq!(thumb.overlay().opacity, 255);
    }

    #[test]
    fn test_reverse_mode_opacity_arms_full_interval() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600)]));
        h.settings.initial_opacity = 200;
        let mut thumb = open(&mut h, 1);
        thumb.handle_pointer(&mut h.ctx(), release(Button::Primary, 0, 0));
        assert!(thumb.reverse_wheel());

        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Up, Modifiers::SHIFT));
        assert_eq!(thumb.opacity(), 224);
        assert_eq!(h.timers.next_deadline(), Some(h.now + h.settings.action_timeout()));
    }

    #[test]
    fn test_ctrl_cycle_without_reverse_arms_half_interval() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600), (2, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);

        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::CTRL));
        assert_eq!(thumb.source(), WindowId(2));
        assert_eq!(h.timers.next_deadline(), Some(h.now + h.settings.action_timeout() / 2));
    }

    #[test]
    fn test_ctrl_resize_in_reverse_mode_arms_full_interval() {
        let mut h = Harness::new(FakeDesktop::with_windows(&[(1, 0, 0, 800, 600), (2, 0, 0, 800, 600)]));
        let mut thumb = open(&mut h, 1);
        let initial = thumb.scale();
        thumb.handle_pointer(&mut h.ctx(), release(Button::Primary, 0, 0));

        thumb.handle_pointer(&mut h.ctx(), scroll(ScrollDirection::Down, Modifiers::CTRL));
        assert_eq!(thumb.source(), WindowId(1));
        assert!((thumb.scale() - (initial + 0.025)).abs() < 1e-9);
        assert_eq!(h.timers.next_deadline(), Some(h.now + h.settings.action_timeout()));
    }
}
