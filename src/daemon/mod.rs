//! Thumbnail daemon
//!
//! The windowing-system independent core (thumbnail state machine, gesture
//! decoding, throttle, timers) plus the X11 event loop that drives it.

mod backend;
mod cycle;
mod dispatcher;
mod drag;
mod gesture;
mod handlers;
mod main_loop;
mod manager;
mod thumbnail;
mod throttle;
mod timers;

#[cfg(test)]
mod testing;

pub use backend::{Overlay, Subscription, TabEntry, WindowSystem};
pub use main_loop::{X11Session, resolve_sources, run_thumbnail_daemon};
