//! X11 backend
//!
//! Provides cached connection state, window queries, pointer event translation,
//! the overlay window and the `WindowSystem` implementation used at runtime.

mod context;
mod desktop;
pub mod input;
mod overlay;
mod window;

pub use context::{AppContext, CachedAtoms, CachedFormats, to_fixed};
pub use desktop::X11Desktop;
pub use window::{active_window, tab_order, window_geometry, window_title};
