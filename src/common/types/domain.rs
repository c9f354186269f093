//! Domain types shared by the thumbnail core and the X11 adapter

use std::fmt;

use super::geometry::Position;

/// Identifier of a top-level window managed by the windowing system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Identifier of a thumbnail overlay; doubles as the thumbnail's identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u32);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Pointer buttons the thumbnail distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
    /// Any other button number (extra mouse buttons)
    Other(u8),
}

/// Scroll wheel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
    /// Continuous scrolling without a discrete direction
    Smooth,
}

/// Keyboard modifiers held while a pointer event happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
    };
}

/// Whether an event was consumed by the thumbnail or should reach lower layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    Stop,
    Propagate,
}

/// Pointer input delivered to a single thumbnail overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press {
        button: Button,
        click_count: u8,
        root: Position,
        time: u32,
    },
    Release {
        button: Button,
        root: Position,
        time: u32,
    },
    Motion {
        root: Position,
    },
    Scroll {
        direction: ScrollDirection,
        modifiers: Modifiers,
    },
}
