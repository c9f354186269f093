//! Persistent daemon settings
//!
//! Loaded from `config.json` under the XDG config directory at startup.
//! A missing file yields the defaults; every missing field falls back to its default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::{config, defaults, thumbnail};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base interval of the scroll action throttle (window cycling uses it
    /// as-is, resizing uses half of it)
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,

    /// Target on-screen width of a new thumbnail
    #[serde(default = "default_initial_width")]
    pub initial_width: u16,

    #[serde(default = "default_spawn_offset")]
    pub spawn_offset: i16,

    #[serde(default = "default_initial_opacity")]
    pub initial_opacity: u8,

    #[serde(default = "default_snap_back_animation_ms")]
    pub snap_back_animation_ms: u32,

    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: u16,

    /// Overlay opacity while the thumbnail is being dragged
    #[serde(default = "default_drag_opacity")]
    pub drag_opacity: u8,

    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            action_timeout_ms: default_action_timeout_ms(),
            initial_width: default_initial_width(),
            spawn_offset: default_spawn_offset(),
            initial_opacity: default_initial_opacity(),
            snap_back_animation_ms: default_snap_back_animation_ms(),
            drag_threshold: default_drag_threshold(),
            drag_opacity: default_drag_opacity(),
            double_click_ms: default_double_click_ms(),
        }
    }
}

fn default_action_timeout_ms() -> u64 {
    defaults::ACTION_TIMEOUT_MS
}

fn default_initial_width() -> u16 {
    defaults::INITIAL_WIDTH
}

fn default_spawn_offset() -> i16 {
    defaults::SPAWN_OFFSET
}

fn default_initial_opacity() -> u8 {
    defaults::INITIAL_OPACITY
}

fn default_snap_back_animation_ms() -> u32 {
    defaults::SNAP_BACK_ANIMATION_MS
}

fn default_drag_threshold() -> u16 {
    defaults::DRAG_THRESHOLD
}

fn default_drag_opacity() -> u8 {
    defaults::DRAG_OPACITY
}

fn default_double_click_ms() -> u32 {
    defaults::DOUBLE_CLICK_MS
}

impl Settings {
    /// Default location of the config file.
    ///
    /// `WINDOW_THUMBNAIL_CONFIG_DIR` replaces the whole directory when set.
    pub fn path() -> PathBuf {
        if let Ok(dir) = std::env::var(config::DIR_ENV) {
            return PathBuf::from(dir).join(config::FILENAME);
        }

        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(settings.sanitized())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config file at {}", path.display()))?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Clamp values the interaction model cannot work with
    pub fn sanitized(mut self) -> Self {
        let opacity = self
            .initial_opacity
            .clamp(thumbnail::MIN_OPACITY, thumbnail::MAX_OPACITY);
        if opacity != self.initial_opacity {
            warn!(
                configured = self.initial_opacity,
                used = opacity,
                "initial_opacity out of range, clamping"
            );
            self.initial_opacity = opacity;
        }

        if self.initial_width == 0 {
            warn!("initial_width must be non-zero, using default");
            self.initial_width = defaults::INITIAL_WIDTH;
        }

        if self.drag_threshold == 0 {
            warn!("drag_threshold must be non-zero, using default");
            self.drag_threshold = defaults::DRAG_THRESHOLD;
        }

        self
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}
