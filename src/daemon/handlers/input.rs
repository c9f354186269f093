use anyhow::Result;
use tracing::{debug, trace};
use x11rb::protocol::xproto::*;

use super::super::dispatcher::EventContext;
use crate::common::types::{OverlayId, Position};
use crate::x11::input;

/// Handle ButtonPress events - presses, double clicks and wheel notches on overlays
#[tracing::instrument(skip(ctx), fields(window = event.event))]
pub fn handle_button_press(ctx: &mut EventContext, event: ButtonPressEvent) -> Result<()> {
    let id = OverlayId(event.event);
    if !ctx.manager.contains(id) {
        return Ok(());
    }

    debug!(
        x = event.root_x,
        y = event.root_y,
        detail = event.detail,
        "ButtonPress received"
    );

    let settings = ctx.manager.settings();
    let click_count = if input::scroll_direction(event.detail).is_some() {
        1
    } else {
        ctx.clicks.register(
            event.event,
            event.detail,
            event.time,
            Position::new(event.root_x, event.root_y),
            settings.double_click_ms,
            settings.drag_threshold,
        )
    };

    let response = ctx
        .manager
        .handle_pointer(id, input::press_event(&event, click_count), ctx.now);
    trace!(?response, "ButtonPress handled");
    Ok(())
}

/// Handle ButtonRelease events - click actions and drag drops
#[tracing::instrument(skip(ctx), fields(window = event.event))]
pub fn handle_button_release(ctx: &mut EventContext, event: ButtonReleaseEvent) -> Result<()> {
    let id = OverlayId(event.event);
    if !ctx.manager.contains(id) {
        return Ok(());
    }
    let Some(pointer) = input::release_event(&event) else {
        return Ok(());
    };

    debug!(
        x = event.root_x,
        y = event.root_y,
        detail = event.detail,
        "ButtonRelease received"
    );

    let response = ctx.manager.handle_pointer(id, pointer, ctx.now);
    trace!(?response, "ButtonRelease handled");
    Ok(())
}

/// Handle MotionNotify events - move dragged overlays
pub fn handle_motion_notify(ctx: &mut EventContext, event: MotionNotifyEvent) -> Result<()> {
    let id = OverlayId(event.event);
    if ctx.manager.contains(id) {
        ctx.manager
            .handle_pointer(id, input::motion_event(&event), ctx.now);
    }
    Ok(())
}
