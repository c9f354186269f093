//! Application context and cached X11 state

use anyhow::{Context, Result};
use x11rb::protocol::render::{ConnectionExt as RenderExt, Fixed, Pictformat};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::constants::{fixed_point, x11};

/// Application context holding immutable shared state
#[derive(Clone, Copy)]
pub struct AppContext<'a> {
    pub conn: &'a RustConnection,
    pub screen: &'a Screen,
    pub atoms: &'a CachedAtoms,
    pub formats: &'a CachedFormats,
}

/// Pre-cached X11 atoms to avoid repeated roundtrips
#[derive(Debug)]
pub struct CachedAtoms {
    pub wm_class: Atom,
    pub wm_name: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_hidden: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_state_skip_taskbar: Atom,
    pub net_wm_window_type: Atom,
    pub net_wm_window_type_normal: Atom,
    pub net_wm_window_opacity: Atom,
    pub net_active_window: Atom,
    pub net_close_window: Atom,
    pub net_client_list_stacking: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .with_context(|| format!("Failed to intern {} atom", name))?
        .reply()
        .with_context(|| format!("Failed to get reply for {} atom", name))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            wm_class: intern(conn, "WM_CLASS")?,
            wm_name: intern(conn, "WM_NAME")?,
            net_wm_name: intern(conn, "_NET_WM_NAME")?,
            utf8_string: intern(conn, "UTF8_STRING")?,
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_hidden: intern(conn, "_NET_WM_STATE_HIDDEN")?,
            net_wm_state_above: intern(conn, "_NET_WM_STATE_ABOVE")?,
            net_wm_state_skip_taskbar: intern(conn, "_NET_WM_STATE_SKIP_TASKBAR")?,
            net_wm_window_type: intern(conn, "_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_normal: intern(conn, "_NET_WM_WINDOW_TYPE_NORMAL")?,
            net_wm_window_opacity: intern(conn, "_NET_WM_WINDOW_OPACITY")?,
            net_active_window: intern(conn, "_NET_ACTIVE_WINDOW")?,
            net_close_window: intern(conn, "_NET_CLOSE_WINDOW")?,
            net_client_list_stacking: intern(conn, "_NET_CLIENT_LIST_STACKING")?,
        })
    }
}

/// Pre-cached picture formats to avoid repeated expensive queries
#[derive(Debug)]
pub struct CachedFormats {
    pub rgb: Pictformat,
    pub argb: Pictformat,
}

impl CachedFormats {
    pub fn new(conn: &RustConnection, screen: &Screen) -> Result<Self> {
        let formats_reply = conn
            .render_query_pict_formats()
            .context("Failed to query RENDER picture formats")?
            .reply()
            .context("Failed to get RENDER formats reply")?;

        let rgb = formats_reply
            .formats
            .iter()
            .find(|f| f.depth == screen.root_depth && f.direct.alpha_mask == 0)
            .ok_or_else(|| anyhow::anyhow!("No RGB format found for depth {}", screen.root_depth))?
            .id;

        let argb = formats_reply
            .formats
            .iter()
            .find(|f| f.depth == x11::ARGB_DEPTH && f.direct.alpha_mask != 0)
            .ok_or_else(|| anyhow::anyhow!("No ARGB format found for depth {}", x11::ARGB_DEPTH))?
            .id;

        Ok(Self { rgb, argb })
    }

    /// Picture format matching a drawable of the given depth
    pub fn for_depth(&self, depth: u8) -> Pictformat {
        if depth == x11::ARGB_DEPTH {
            self.argb
        } else {
            self.rgb
        }
    }
}

/// Convert floating point to X11 fixed-point format
pub fn to_fixed(v: f32) -> Fixed {
    (v * fixed_point::MULTIPLIER).round() as Fixed
}
