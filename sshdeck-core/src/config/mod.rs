//! Configuration management for `SSHDeck`
//!
//! This module provides the `ConfigManager` for loading and saving
//! client settings in TOML format.

mod manager;
pub mod settings;

pub use manager::{ConfigManager, SETTINGS_FILE_NAME};
pub use settings::{ClientSettings, ConnectionSettings, ExecutionSettings, LoggingSettings};
