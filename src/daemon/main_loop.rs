//! Daemon main loop and initialization

use anyhow::{Context, Result, bail};
use std::os::fd::AsRawFd;
use std::time::Instant;
use tokio::io::unix::AsyncFd;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::{error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::composite::ConnectionExt as CompositeExt;
use x11rb::protocol::damage::ConnectionExt as DamageExt;
use x11rb::rust_connection::RustConnection;

use crate::common::types::WindowId;
use crate::config::Settings;
use crate::x11::input::ClickCounter;
use crate::x11::{self, AppContext, CachedAtoms, CachedFormats, X11Desktop};

use super::dispatcher::{EventContext, handle_event};
use super::manager::ThumbnailManager;

/// Connection and extension state shared by the whole daemon
pub struct X11Session {
    pub conn: RustConnection,
    pub screen_num: usize,
    pub atoms: CachedAtoms,
    pub formats: CachedFormats,
}

impl X11Session {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)
            .context("Failed to connect to X11 server. Is DISPLAY set correctly?")?;

        let screen = &conn.setup().roots[screen_num];
        info!(
            screen = screen_num,
            width = screen.width_in_pixels,
            height = screen.height_in_pixels,
            "Connected to X11 server"
        );

        // Pre-cache atoms once at startup
        let atoms = CachedAtoms::new(&conn).context("Failed to cache X11 atoms at startup")?;

        conn.composite_query_version(0, 4)
            .context("Failed to query COMPOSITE extension version")?
            .reply()
            .context("COMPOSITE extension is not available")?;
        conn.damage_query_version(1, 1)
            .context("Failed to query DAMAGE extension version")?
            .reply()
            .context("DAMAGE extension is not available")?;

        let formats = CachedFormats::new(&conn, screen)
            .context("Failed to cache picture formats at startup")?;

        Ok(Self {
            conn,
            screen_num,
            atoms,
            formats,
        })
    }

    pub fn context(&self) -> AppContext<'_> {
        AppContext {
            conn: &self.conn,
            screen: &self.conn.setup().roots[self.screen_num],
            atoms: &self.atoms,
            formats: &self.formats,
        }
    }
}

/// Source windows to mirror: the explicit list, or the active window
pub fn resolve_sources(ctx: &AppContext, requested: &[WindowId]) -> Result<Vec<WindowId>> {
    if !requested.is_empty() {
        return Ok(requested.to_vec());
    }
    match x11::active_window(ctx)? {
        Some(window) => Ok(vec![WindowId(window)]),
        None => bail!("No active window to mirror, pass --window explicitly"),
    }
}

/// SIGINT/SIGTERM listeners, registered once for the whole loop so signals
/// arriving while events are drained stay queued
struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl ShutdownSignals {
    fn register() -> Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())
                .context("Failed to register SIGINT handler")?,
            terminate: signal(SignalKind::terminate())
                .context("Failed to register SIGTERM handler")?,
        })
    }

    /// Resolves with the name of the first shutdown signal received
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

async fn run_event_loop(
    conn: &RustConnection,
    manager: &mut ThumbnailManager<X11Desktop<'_>>,
) -> Result<()> {
    let mut shutdown = ShutdownSignals::register()?;

    // Wrap X11 connection in AsyncFd for async polling
    let x11_fd = AsyncFd::new(conn.stream().as_raw_fd())
        .context("Failed to create AsyncFd for X11 connection")?;

    let mut clicks = ClickCounter::new();

    loop {
        manager.fire_due_timers(Instant::now());

        // Drain every queued event before sleeping
        while let Some(event) = conn
            .poll_for_event()
            .context("Failed to poll for X11 event")?
        {
            let mut context = EventContext {
                manager: &mut *manager,
                clicks: &mut clicks,
                now: Instant::now(),
            };
            let _ = handle_event(&mut context, event)
                .inspect_err(|err| error!(error = ?err, "Event handling error"));
        }
        let _ = conn.flush();

        if manager.is_empty() {
            info!("Last thumbnail closed");
            return Ok(());
        }

        let deadline = manager.next_deadline();
        let timer = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            name = shutdown.recv() => {
                info!(signal = name, "Shutdown signal received");
                return Ok(());
            }
            _ = timer => {}
            ready = x11_fd.readable() => {
                match ready {
                    Ok(mut guard) => {
                        // Clear readiness or readable() fires again immediately
                        guard.clear_ready();
                    }
                    Err(e) => {
                        error!(error = ?e, "Failed to poll X11 fd readiness");
                    }
                }
            }
        }
    }
}

/// Open thumbnails for `sources` and run until the last one is gone or a
/// termination signal arrives.
pub async fn run_thumbnail_daemon(
    session: &X11Session,
    settings: Settings,
    sources: &[WindowId],
) -> Result<()> {
    let ctx = session.context();
    let mut manager = ThumbnailManager::new(X11Desktop::new(ctx), settings);

    let now = Instant::now();
    for &source in sources {
        if let Err(e) = manager.open(source, now) {
            warn!(source = %source, error = ?e, "Failed to create thumbnail");
        }
    }
    if manager.is_empty() {
        bail!("No thumbnail could be created");
    }
    info!(count = manager.len(), "Thumbnail daemon running");

    let result = run_event_loop(&session.conn, &mut manager).await;

    manager.teardown_all(Instant::now());
    let _ = session.conn.flush();
    result
}
