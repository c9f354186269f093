//! Thumbnail overlay window
//!
//! An override-redirect window kept above everything else. The bound source is
//! redirected off-screen with COMPOSITE and scaled into the overlay with a RENDER
//! transform; DAMAGE on the source tells the event loop when to repaint.

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::composite::{ConnectionExt as CompositeExt, Redirect};
use x11rb::protocol::damage::{ConnectionExt as DamageExt, Damage, ReportLevel};
use x11rb::protocol::render::{
    ConnectionExt as RenderExt, CreatePictureAux, PictOp, Picture, Transform,
};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::common::types::{Dimensions, OverlayId, Position, WindowId};
use crate::constants::x11;
use crate::daemon::Overlay;

use super::{AppContext, to_fixed};

/// Render resources tied to the currently mirrored window
#[derive(Debug)]
struct SourceBinding {
    window: Window,
    native: Dimensions,
    picture: Picture,
    damage: Damage,
}

pub struct X11Overlay<'a> {
    window: Window,
    picture: Picture,
    source: Option<SourceBinding>,
    position: Position,
    dimensions: Dimensions,
    destroyed: bool,
    ctx: AppContext<'a>,
}

impl<'a> X11Overlay<'a> {
    /// Create and configure the X11 window
    fn create_window(ctx: &AppContext, position: Position, dimensions: Dimensions) -> Result<Window> {
        let window = ctx
            .conn
            .generate_id()
            .context("Failed to generate X11 window ID")?;
        ctx.conn
            .create_window(
                ctx.screen.root_depth,
                window,
                ctx.screen.root,
                position.x,
                position.y,
                dimensions.width,
                dimensions.height,
                0,
                WindowClass::INPUT_OUTPUT,
                ctx.screen.root_visual,
                &CreateWindowAux::new()
                    .override_redirect(x11::OVERRIDE_REDIRECT)
                    .event_mask(
                        EventMask::EXPOSURE
                            | EventMask::BUTTON_PRESS
                            | EventMask::BUTTON_RELEASE
                            | EventMask::POINTER_MOTION,
                    ),
            )
            .context("Failed to create overlay window")?;
        Ok(window)
    }

    /// Setup window properties (WM_CLASS, always-on-top)
    fn setup_window_properties(ctx: &AppContext, window: Window) -> Result<()> {
        ctx.conn
            .change_property8(
                PropMode::REPLACE,
                window,
                ctx.atoms.wm_class,
                AtomEnum::STRING,
                x11::WM_CLASS,
            )
            .context("Failed to set WM_CLASS on overlay")?;

        ctx.conn
            .change_property32(
                PropMode::REPLACE,
                window,
                ctx.atoms.net_wm_state,
                AtomEnum::ATOM,
                &[ctx.atoms.net_wm_state_above],
            )
            .context("Failed to set overlay always-on-top")?;
        Ok(())
    }

    /// Creates a hidden overlay mirroring `source` at `position` and `scale`.
    ///
    /// # Errors
    /// Returns an error if any X11 resource creation fails; partially created
    /// resources are released.
    pub fn new(ctx: AppContext<'a>, source: WindowId, position: Position, scale: f64) -> Result<Self> {
        let native = source_dimensions(&ctx, source.0)?;
        let dimensions = native.scaled(scale);
        let window = Self::create_window(&ctx, position, dimensions)?;

        // RAII guard destroying the window if initialization fails partially
        struct WindowGuard<'a> {
            conn: &'a RustConnection,
            window: Window,
            should_cleanup: bool,
        }

        impl Drop for WindowGuard<'_> {
            fn drop(&mut self) {
                if self.should_cleanup {
                    if let Err(e) = self.conn.destroy_window(self.window) {
                        error!(window = self.window, error = %e, "Failed to cleanup overlay after initialization failure");
                    }
                    let _ = self.conn.flush();
                }
            }
        }

        let mut window_guard = WindowGuard {
            conn: ctx.conn,
            window,
            should_cleanup: true,
        };

        Self::setup_window_properties(&ctx, window)?;

        let picture = ctx
            .conn
            .generate_id()
            .context("Failed to generate ID for overlay picture")?;
        ctx.conn
            .render_create_picture(picture, window, ctx.formats.rgb, &CreatePictureAux::new())
            .context("Failed to create overlay picture")?;

        let mut overlay = Self {
            window,
            picture,
            source: None,
            position,
            dimensions,
            destroyed: false,
            ctx,
        };
        // From here on the overlay's Drop releases everything
        window_guard.should_cleanup = false;
        overlay.bind(source.0)?;

        info!(overlay = window, source = %source, "Created overlay window");
        Ok(overlay)
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn damage(&self) -> Option<Damage> {
        self.source.as_ref().map(|binding| binding.damage)
    }

    /// Redirect `source` off-screen and attach picture and damage tracking to it
    fn bind(&mut self, source: Window) -> Result<()> {
        let conn = self.ctx.conn;

        conn.composite_redirect_window(source, Redirect::AUTOMATIC)
            .with_context(|| format!("Failed to redirect window {} (check COMPOSITE extension)", source))?;

        let geom = conn
            .get_geometry(source)
            .context("Failed to send geometry query for source window")?
            .reply()
            .with_context(|| format!("Failed to get geometry for source window {}", source))?;

        let picture = conn
            .generate_id()
            .context("Failed to generate ID for source picture")?;
        conn.render_create_picture(
            picture,
            source,
            self.ctx.formats.for_depth(geom.depth),
            &CreatePictureAux::new().subwindowmode(SubwindowMode::INCLUDE_INFERIORS),
        )
        .with_context(|| format!("Failed to create source picture for window {}", source))?;

        // Bilinear filtering keeps downscaled text readable
        conn.render_set_picture_filter(picture, b"bilinear", &[])
            .context("Failed to set bilinear filter on source picture")?;

        let damage = conn
            .generate_id()
            .context("Failed to generate ID for damage tracking")?;
        conn.damage_create(damage, source, ReportLevel::NON_EMPTY)
            .with_context(|| format!("Failed to create damage tracking for window {} (check DAMAGE extension)", source))?;

        debug!(overlay = self.window, source = source, depth = geom.depth, "Bound source window");
        self.source = Some(SourceBinding {
            window: source,
            native: Dimensions::new(geom.width, geom.height),
            picture,
            damage,
        });
        Ok(())
    }

    /// Release the resources of the current binding.
    /// Cleans up each resource independently so one failure does not leak the rest.
    fn unbind(&mut self) {
        let Some(binding) = self.source.take() else {
            return;
        };
        let conn = self.ctx.conn;

        if let Err(e) = conn.damage_destroy(binding.damage) {
            error!(damage = binding.damage, error = %e, "Failed to destroy damage");
        }
        if let Err(e) = conn.render_free_picture(binding.picture) {
            error!(picture = binding.picture, error = %e, "Failed to free source picture");
        }
        if let Err(e) = conn.composite_unredirect_window(binding.window, Redirect::AUTOMATIC) {
            debug!(window = binding.window, error = %e, "Failed to unredirect source window");
        }
    }

    /// Composite the current source content into the overlay
    pub fn redraw(&self) -> Result<()> {
        let Some(binding) = &self.source else {
            return Ok(());
        };

        // Unmapped or freshly created windows can report 1x1
        if binding.native.width <= 1 || binding.native.height <= 1 {
            return Ok(());
        }

        let transform = Transform {
            matrix11: to_fixed(binding.native.width as f32 / self.dimensions.width as f32),
            matrix22: to_fixed(binding.native.height as f32 / self.dimensions.height as f32),
            matrix33: to_fixed(1.0),
            ..Default::default()
        };
        self.ctx
            .conn
            .render_set_picture_transform(binding.picture, transform)
            .context("Failed to set source transform")?;
        self.ctx
            .conn
            .render_composite(
                PictOp::SRC,
                binding.picture,
                x11rb::NONE,
                self.picture,
                0,
                0,
                0,
                0,
                0,
                0,
                self.dimensions.width,
                self.dimensions.height,
            )
            .with_context(|| format!("Failed to composite window {} into overlay", binding.window))?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.ctx
            .conn
            .flush()
            .context("Failed to flush X11 connection")
    }
}

/// Native size of a window
fn source_dimensions(ctx: &AppContext, window: Window) -> Result<Dimensions> {
    let geom = ctx
        .conn
        .get_geometry(window)
        .context("Failed to send geometry query for source window")?
        .reply()
        .with_context(|| format!("Failed to get geometry for source window {}", window))?;
    Ok(Dimensions::new(geom.width, geom.height))
}

impl Overlay for X11Overlay<'_> {
    fn id(&self) -> OverlayId {
        OverlayId(self.window)
    }

    fn set_source(&mut self, source: Option<WindowId>) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.unbind();
        if let Some(source) = source {
            self.bind(source.0)?;
            self.redraw()?;
        }
        self.flush()
    }

    fn set_scale(&mut self, scale: f64) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        // Follow the source's current size, it may have changed since binding
        if let Some(window) = self.source.as_ref().map(|binding| binding.window) {
            let native = source_dimensions(&self.ctx, window)?;
            if let Some(binding) = self.source.as_mut() {
                binding.native = native;
            }
            self.dimensions = native.scaled(scale);
        }

        self.ctx
            .conn
            .configure_window(
                self.window,
                &ConfigureWindowAux::new()
                    .width(self.dimensions.width as u32)
                    .height(self.dimensions.height as u32),
            )
            .context("Failed to resize overlay window")?;
        self.redraw()?;
        self.flush()
    }

    fn set_opacity(&mut self, opacity: u8) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.ctx
            .conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.ctx.atoms.net_wm_window_opacity,
                AtomEnum::CARDINAL,
                &[opacity as u32 * x11::OPACITY_MULTIPLIER],
            )
            .context("Failed to set overlay opacity")?;
        self.flush()
    }

    fn set_position(&mut self, position: Position) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.ctx
            .conn
            .configure_window(
                self.window,
                &ConfigureWindowAux::new()
                    .x(position.x as i32)
                    .y(position.y as i32),
            )
            .with_context(|| format!("Failed to move overlay to ({}, {})", position.x, position.y))?;
        self.position = position;
        self.flush()
    }

    fn position(&self) -> Position {
        self.position
    }

    fn show(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.ctx
            .conn
            .map_window(self.window)
            .context("Failed to map overlay window")?;
        self.ctx
            .conn
            .configure_window(self.window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
            .context("Failed to raise overlay window")?;
        self.redraw()?;
        self.flush()
    }

    fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.unbind();

        if let Err(e) = self.ctx.conn.render_free_picture(self.picture) {
            error!(picture = self.picture, error = %e, "Failed to free overlay picture");
        }
        if let Err(e) = self.ctx.conn.destroy_window(self.window) {
            warn!(window = self.window, error = %e, "Failed to destroy overlay window");
        }
        debug!(overlay = self.window, "Destroyed overlay window");
        self.flush()
    }
}

impl Drop for X11Overlay<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            error!(window = self.window, error = %e, "Failed to release overlay during drop");
        }
    }
}
