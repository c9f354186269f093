//! X11 event processing for the thumbnail daemon
//!
//! Dispatcher that routes X11 events to specialized handlers.

use anyhow::Result;
use std::time::Instant;
use tracing::debug;
use x11rb::protocol::Event;

use crate::x11::X11Desktop;
use crate::x11::input::ClickCounter;

use super::handlers;
use super::manager::ThumbnailManager;

/// Context bundle for event handlers to reduce argument count
pub struct EventContext<'a, 'b> {
    pub manager: &'b mut ThumbnailManager<X11Desktop<'a>>,
    pub clicks: &'b mut ClickCounter,
    /// Time at which the current batch of events is processed
    pub now: Instant,
}

pub fn handle_event(ctx: &mut EventContext, event: Event) -> Result<()> {
    match event {
        Event::ButtonPress(event) => handlers::input::handle_button_press(ctx, event),
        Event::ButtonRelease(event) => handlers::input::handle_button_release(ctx, event),
        Event::MotionNotify(event) => handlers::input::handle_motion_notify(ctx, event),
        Event::DamageNotify(event) => handlers::window::handle_damage_notify(ctx, event),
        Event::Expose(event) => handlers::window::handle_expose(ctx, event),
        Event::DestroyNotify(event) => handlers::window::handle_destroy_notify(ctx, event),
        Event::ConfigureNotify(event) => handlers::window::handle_configure_notify(ctx, event),
        Event::Error(err) => {
            // Requests on windows that vanished in the meantime fail asynchronously
            debug!(error = ?err, "X11 error event");
            Ok(())
        }
        _ => Ok(()),
    }
}
