//! X11 window state queries and operations

use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;

use crate::common::types::{WindowGeometry, WindowId};
use crate::constants::x11;
use crate::daemon::TabEntry;

use super::{AppContext, CachedAtoms};

/// Read a 32-bit list property. Returns None when the window is already gone.
fn property32(
    ctx: &AppContext,
    window: Window,
    property: Atom,
    type_: impl Into<Atom>,
) -> Result<Option<Vec<u32>>> {
    let cookie = ctx
        .conn
        .get_property(false, window, property, type_, 0, 1024)
        .with_context(|| format!("Failed to query property {} on window {}", property, window))?;
    match cookie.reply() {
        Ok(reply) => Ok(Some(reply.value32().map(|v| v.collect()).unwrap_or_default())),
        Err(ReplyError::X11Error(err)) if err.error_kind == x11rb::protocol::ErrorKind::Window => {
            debug!(window = window, property = property, "Window destroyed before property reply");
            Ok(None)
        }
        Err(err) => Err(err)
            .with_context(|| format!("Failed to get property {} reply for window {}", property, window)),
    }
}

/// Root-relative position and native size of a window
pub fn window_geometry(ctx: &AppContext, window: Window) -> Result<WindowGeometry> {
    let geom = ctx
        .conn
        .get_geometry(window)
        .context("Failed to send geometry query")?
        .reply()
        .with_context(|| format!("Failed to get geometry for window {}", window))?;

    // Reparenting window managers make geometry parent-relative
    let origin = ctx
        .conn
        .translate_coordinates(window, ctx.screen.root, 0, 0)
        .context("Failed to send translate_coordinates request")?
        .reply()
        .with_context(|| format!("Failed to translate coordinates of window {}", window))?;

    Ok(WindowGeometry::new(origin.dst_x, origin.dst_y, geom.width, geom.height))
}

/// The window the window manager reports as focused, if any
pub fn active_window(ctx: &AppContext) -> Result<Option<Window>> {
    let values = property32(ctx, ctx.screen.root, ctx.atoms.net_active_window, AtomEnum::WINDOW)
        .context("Failed to read _NET_ACTIVE_WINDOW")?;
    Ok(values
        .and_then(|v| v.first().copied())
        .filter(|&window| window != x11rb::NONE))
}

/// Managed windows, topmost first
pub fn stacking_order(ctx: &AppContext) -> Result<Vec<Window>> {
    let mut windows = property32(
        ctx,
        ctx.screen.root,
        ctx.atoms.net_client_list_stacking,
        AtomEnum::WINDOW,
    )
    .context("Failed to read _NET_CLIENT_LIST_STACKING")?
    .unwrap_or_default();
    // EWMH lists bottom-to-top
    windows.reverse();
    Ok(windows)
}

/// Derive the tab entry flags from a window's `_NET_WM_STATE` and `_NET_WM_WINDOW_TYPE`
pub fn classify(window: WindowId, states: &[Atom], types: &[Atom], atoms: &CachedAtoms) -> TabEntry {
    TabEntry {
        window,
        normal: types.is_empty() || types.contains(&atoms.net_wm_window_type_normal),
        minimized: states.contains(&atoms.net_wm_state_hidden),
        skip_taskbar: states.contains(&atoms.net_wm_state_skip_taskbar),
    }
}

/// Windows in the order a window switcher would present them.
/// Windows that vanish while being queried are left out.
pub fn tab_order(ctx: &AppContext) -> Result<Vec<TabEntry>> {
    let mut entries = Vec::new();
    for window in stacking_order(ctx)? {
        let Some(states) = property32(ctx, window, ctx.atoms.net_wm_state, AtomEnum::ATOM)? else {
            continue;
        };
        let Some(types) = property32(ctx, window, ctx.atoms.net_wm_window_type, AtomEnum::ATOM)?
        else {
            continue;
        };
        entries.push(classify(WindowId(window), &states, &types, ctx.atoms));
    }
    Ok(entries)
}

/// Human readable title, preferring `_NET_WM_NAME`
pub fn window_title(ctx: &AppContext, window: Window) -> Result<String> {
    let utf8 = ctx
        .conn
        .get_property(false, window, ctx.atoms.net_wm_name, ctx.atoms.utf8_string, 0, 1024)
        .with_context(|| format!("Failed to query _NET_WM_NAME for window {}", window))?
        .reply()
        .with_context(|| format!("Failed to get _NET_WM_NAME reply for window {}", window))?;
    if !utf8.value.is_empty() {
        return Ok(String::from_utf8_lossy(&utf8.value).into_owned());
    }

    let legacy = ctx
        .conn
        .get_property(false, window, ctx.atoms.wm_name, AtomEnum::STRING, 0, 1024)
        .with_context(|| format!("Failed to query WM_NAME for window {}", window))?
        .reply()
        .with_context(|| format!("Failed to get WM_NAME reply for window {}", window))?;
    Ok(String::from_utf8_lossy(&legacy.value).into_owned())
}

fn send_root_message(ctx: &AppContext, window: Window, type_: Atom, data: [u32; 5]) -> Result<()> {
    let event = ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window,
        type_,
        data: ClientMessageData::from(data),
    };

    ctx.conn
        .send_event(
            false,
            ctx.screen.root,
            EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
            event,
        )
        .with_context(|| format!("Failed to send client message {} for window {}", type_, window))?;

    ctx.conn
        .flush()
        .context("Failed to flush X11 connection after client message")?;
    Ok(())
}

/// Activate (raise and focus) a window using _NET_ACTIVE_WINDOW
///
/// # Arguments
/// * `timestamp` - X11 timestamp from the input event that triggered this action.
pub fn activate_window(ctx: &AppContext, window: Window, timestamp: u32) -> Result<()> {
    send_root_message(
        ctx,
        window,
        ctx.atoms.net_active_window,
        [x11::SOURCE_INDICATION_PAGER, timestamp, 0, 0, 0],
    )
    .with_context(|| format!("Failed to activate window {}", window))?;
    info!(window = window, timestamp = timestamp, "Activated window");
    Ok(())
}

/// Ask the window manager to close a window as if its close button was clicked
pub fn close_window(ctx: &AppContext, window: Window, timestamp: u32) -> Result<()> {
    send_root_message(
        ctx,
        window,
        ctx.atoms.net_close_window,
        [timestamp, x11::SOURCE_INDICATION_PAGER, 0, 0, 0],
    )
    .with_context(|| format!("Failed to request close of window {}", window))
}
