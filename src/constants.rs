//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// X11 protocol constants
pub mod x11 {
    /// Override redirect flag for unmanaged windows
    pub const OVERRIDE_REDIRECT: u32 = 1;

    /// Source indication for EWMH client messages (2 = pager/direct user action)
    pub const SOURCE_INDICATION_PAGER: u32 = 2;

    /// Standard 32-bit color depth required for ARGB composition
    pub const ARGB_DEPTH: u8 = 32;

    /// `_NET_WM_WINDOW_OPACITY` multiplier turning an 8-bit alpha into a CARDINAL
    pub const OPACITY_MULTIPLIER: u32 = 0x0101_0101;

    /// WM_CLASS set on every overlay window (instance\0class\0)
    pub const WM_CLASS: &[u8] = b"window-thumbnail\0window-thumbnail\0";
}

/// Core pointer button numbers as reported by the X server
pub mod mouse {
    pub const BUTTON_PRIMARY: u8 = 1;
    pub const BUTTON_MIDDLE: u8 = 2;
    pub const BUTTON_SECONDARY: u8 = 3;
    pub const SCROLL_UP: u8 = 4;
    pub const SCROLL_DOWN: u8 = 5;
    pub const SCROLL_LEFT: u8 = 6;
    pub const SCROLL_RIGHT: u8 = 7;
}

/// Limits and step sizes of the thumbnail interaction model
pub mod thumbnail {
    pub const MIN_SCALE: f64 = 0.1;
    pub const MAX_SCALE: f64 = 1.0;

    /// Scale change per resize scroll notch
    pub const SCALE_STEP: f64 = 0.025;

    pub const MIN_OPACITY: u8 = 48;
    pub const MAX_OPACITY: u8 = 255;

    /// Opacity change per shift+scroll notch
    pub const OPACITY_STEP: u8 = 24;

    /// Size of the position nudge that forces the hit region to follow a new scale
    pub const REDRAW_NUDGE: i16 = 1;
}

/// Fixed-point arithmetic constants (X11 render transforms)
pub mod fixed_point {
    /// Fixed-point multiplier for conversion (2^16)
    pub const MULTIPLIER: f32 = 65536.0;
}

/// Configuration paths and filenames
pub mod config {
    /// Application directory name under XDG config
    pub const APP_DIR: &str = "window-thumbnail";

    /// Configuration filename
    pub const FILENAME: &str = "config.json";

    /// Environment variable overriding the configuration directory
    pub const DIR_ENV: &str = "WINDOW_THUMBNAIL_CONFIG_DIR";
}

/// Default configuration values
/// These are used when the config file or one of its fields is missing
pub mod defaults {
    /// Base interval of the scroll action throttle in milliseconds
    pub const ACTION_TIMEOUT_MS: u64 = 200;

    /// Target on-screen width of a freshly created thumbnail
    pub const INITIAL_WIDTH: u16 = 300;

    /// Offset from the source window's top-left corner when spawning.
    /// Keeps the release of the click that opened a thumbnail over a maximized
    /// window from landing on the thumbnail itself.
    pub const SPAWN_OFFSET: i16 = 2;

    pub const INITIAL_OPACITY: u8 = 255;

    /// Snap-back animation duration used by the drag tracker for cancelled drags
    pub const SNAP_BACK_ANIMATION_MS: u32 = 250;

    /// Overlay opacity while a drag is in progress
    pub const DRAG_OPACITY: u8 = 200;

    /// Pointer travel (pixels) before a primary press turns into a drag
    pub const DRAG_THRESHOLD: u16 = 8;

    /// Maximum delay between two presses counted as a double click
    pub const DOUBLE_CLICK_MS: u32 = 400;
}
