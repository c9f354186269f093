use anyhow::{Context, Result};
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::damage::ConnectionExt as DamageExt;
use x11rb::protocol::xproto::*;

use super::super::dispatcher::EventContext;
use crate::common::types::{Dimensions, WindowId};

/// Handle DamageNotify events - repaint the overlays mirroring the damaged window
pub fn handle_damage_notify(
    ctx: &mut EventContext,
    event: x11rb::protocol::damage::NotifyEvent,
) -> Result<()> {
    let Some(thumbnail) = ctx
        .manager
        .iter()
        .find(|thumbnail| thumbnail.overlay().damage() == Some(event.damage))
    else {
        return Ok(());
    };

    thumbnail.overlay().redraw().context(format!(
        "Failed to update thumbnail for damage event (damage={})",
        event.damage
    ))?;

    let conn = ctx.manager.windows().context().conn;
    conn.damage_subtract(event.damage, x11rb::NONE, x11rb::NONE)
        .context(format!(
            "Failed to subtract damage region (damage={})",
            event.damage
        ))?;
    conn.flush()
        .context("Failed to flush X11 connection after damage update")?;
    Ok(())
}

/// Handle Expose events - repaint an uncovered overlay once per expose batch
pub fn handle_expose(ctx: &mut EventContext, event: ExposeEvent) -> Result<()> {
    if event.count != 0 {
        return Ok(());
    }
    if let Some(thumbnail) = ctx
        .manager
        .iter()
        .find(|thumbnail| thumbnail.overlay().window() == event.window)
    {
        thumbnail
            .overlay()
            .redraw()
            .context(format!("Failed to redraw exposed overlay {}", event.window))?;
    }
    Ok(())
}

/// Handle DestroyNotify events - tear down thumbnails whose source went away
pub fn handle_destroy_notify(ctx: &mut EventContext, event: DestroyNotifyEvent) -> Result<()> {
    let window = WindowId(event.window);
    if ctx.manager.iter().any(|thumbnail| thumbnail.source() == window) {
        debug!(window = event.window, "Source window destroyed");
        ctx.manager.handle_source_destroyed(window, ctx.now);
    }
    Ok(())
}

/// Handle ConfigureNotify events - follow size changes of source windows
pub fn handle_configure_notify(ctx: &mut EventContext, event: ConfigureNotifyEvent) -> Result<()> {
    // Overlays and unrelated windows also report here
    if event.event != event.window || !ctx.manager.windows().is_watched(WindowId(event.window)) {
        return Ok(());
    }
    ctx.manager.handle_source_configured(
        WindowId(event.window),
        Dimensions::new(event.width, event.height),
    );
    Ok(())
}
