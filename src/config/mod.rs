//! Configuration management
//!
//! Handles JSON-persisted daemon settings (throttle interval, initial size,
//! drag and double-click tuning).

pub mod settings;

pub use settings::Settings;
