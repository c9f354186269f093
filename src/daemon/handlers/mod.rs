//! Handlers for the X11 events the daemon reacts to

pub mod input;
pub mod window;
