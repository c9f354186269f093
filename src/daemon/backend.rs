//! Capabilities the thumbnail core consumes from the windowing stack
//!
//! The core never touches X11 directly. `crate::x11::X11Desktop` implements these
//! traits for a live X server; tests use a recording fake.

use anyhow::Result;

use crate::common::types::{OverlayId, Position, WindowGeometry, WindowId};

/// Handle of an active destruction subscription on a source window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: u64,
    pub window: WindowId,
}

/// One entry of the windowing system's tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabEntry {
    pub window: WindowId,
    /// Regular application window (not a dock, dialog-less desktop, etc.)
    pub normal: bool,
    pub minimized: bool,
    pub skip_taskbar: bool,
}

impl TabEntry {
    /// Whether the window takes part in thumbnail source cycling
    pub fn is_switchable(&self) -> bool {
        self.normal && !self.minimized && !self.skip_taskbar
    }
}

/// Window queries, window requests and overlay placement
pub trait WindowSystem {
    type Overlay: Overlay;

    /// Create a reactive overlay mirroring `source`, placed at `position` with `scale`.
    /// The overlay stays hidden until `Overlay::show`.
    fn create_overlay(
        &mut self,
        source: WindowId,
        position: Position,
        scale: f64,
    ) -> Result<Self::Overlay>;

    /// Root-relative position and native size of a window
    fn geometry(&self, window: WindowId) -> Result<WindowGeometry>;

    /// Ordered list of windows as the user would switch through them
    fn tab_list(&self) -> Result<Vec<TabEntry>>;

    /// Bring `window` to the foreground and focus it
    fn activate(&mut self, window: WindowId, time: u32) -> Result<()>;

    /// Ask `window` to close itself, as if the user clicked its close button
    fn request_close(&mut self, window: WindowId, time: u32) -> Result<()>;

    fn subscribe_destroy(&mut self, window: WindowId) -> Result<Subscription>;

    fn unsubscribe_destroy(&mut self, subscription: Subscription) -> Result<()>;
}

/// A floating, positioned miniature bound to a source window
pub trait Overlay {
    fn id(&self) -> OverlayId;

    /// Rebind the mirrored surface. `None` detaches it.
    fn set_source(&mut self, source: Option<WindowId>) -> Result<()>;

    /// Size factor relative to the bound source's native size
    fn set_scale(&mut self, scale: f64) -> Result<()>;

    fn set_opacity(&mut self, opacity: u8) -> Result<()>;

    fn set_position(&mut self, position: Position) -> Result<()>;

    fn position(&self) -> Position;

    fn show(&mut self) -> Result<()>;

    /// Release the overlay. Further calls on a destroyed overlay are no-ops.
    fn destroy(&mut self) -> Result<()>;
}
