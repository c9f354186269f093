#![deny(unsafe_code)]

mod common;
mod config;
mod constants;
mod daemon;
mod x11;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::common::types::WindowId;
use crate::config::Settings;
use crate::daemon::X11Session;

#[derive(Parser)]
#[command(name = "window-thumbnail")]
#[command(version)]
#[command(about = "Floating live thumbnails of X11 windows", long_about = None)]
struct Cli {
    /// Window to mirror (decimal or 0x-prefixed hex). Repeat for several thumbnails.
    /// Defaults to the active window.
    #[arg(long = "window", value_name = "ID", value_parser = parse_window_id)]
    windows: Vec<WindowId>,

    /// Print the windows thumbnails can cycle through and exit
    #[arg(long)]
    list: bool,

    /// Base interval of the scroll action throttle in milliseconds
    #[arg(long, value_name = "MS")]
    action_timeout: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the effective settings back to the config file
    #[arg(long)]
    save_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_window_id(raw: &str) -> Result<WindowId, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => raw.parse::<u32>(),
    };
    parsed
        .map(WindowId)
        .map_err(|e| format!("invalid window id '{}': {}", raw, e))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_settings(cli: &Cli) -> Result<(Settings, PathBuf)> {
    let path = cli.config.clone().unwrap_or_else(Settings::path);
    let mut settings = Settings::load_from(&path)?;
    if let Some(timeout) = cli.action_timeout {
        settings.action_timeout_ms = timeout;
    }
    Ok((settings, path))
}

fn list_windows(session: &X11Session) -> Result<()> {
    let ctx = session.context();
    for entry in x11::tab_order(&ctx)?.into_iter().filter(|e| e.is_switchable()) {
        let geometry = match x11::window_geometry(&ctx, entry.window.0) {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!(window = %entry.window, error = %e, "Skipping window");
                continue;
            }
        };
        let title = x11::window_title(&ctx, entry.window.0).unwrap_or_default();
        println!(
            "{:>10}  {}x{}+{}+{}  {}",
            entry.window.to_string(),
            geometry.dimensions.width,
            geometry.dimensions.height,
            geometry.position.x,
            geometry.position.y,
            title
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (settings, config_path) = load_settings(&cli)?;
    if cli.save_config {
        settings.save_to(&config_path)?;
    }

    if std::env::var("XDG_SESSION_TYPE").is_ok_and(|session| session == "wayland") {
        warn!("Wayland session detected, only XWayland windows can be mirrored");
    }

    let session = X11Session::connect()?;

    if cli.list {
        return list_windows(&session);
    }

    let sources = daemon::resolve_sources(&session.context(), &cli.windows)?;
    info!(count = sources.len(), "Mirroring windows");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    rt.block_on(daemon::run_thumbnail_daemon(&session, settings, &sources))
}
