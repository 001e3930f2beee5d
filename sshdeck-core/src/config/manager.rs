//! Loading and saving of [`ClientSettings`]

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::settings::ClientSettings;
use crate::error::{ConfigError, ConfigResult};
use crate::tracing::span_names;

/// Settings file name inside the configuration directory
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Reads and writes settings under a configuration directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the user configuration directory
    /// (`$XDG_CONFIG_HOME/sshdeck` on Linux)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if the platform has no
    /// configuration directory.
    pub fn new() -> ConfigResult<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_config_dir(base.join("sshdeck")))
    }

    /// Creates a manager for an explicit directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    /// Loads settings; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// holds invalid values.
    pub fn load_settings(&self) -> ConfigResult<ClientSettings> {
        let _span = crate::trace_operation_debug!(span_names::CONFIG_LOAD).entered();
        let path = self.settings_path();

        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(ClientSettings::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let settings: ClientSettings =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;

        debug!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Validates and writes settings, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the file cannot be written.
    pub fn save_settings(&self, settings: &ClientSettings) -> ConfigResult<()> {
        let _span = crate::trace_operation_debug!(span_names::CONFIG_SAVE).entered();
        settings.validate()?;

        fs::create_dir_all(&self.config_dir).map_err(|e| ConfigError::Write {
            path: self.config_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let content =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        let path = self.settings_path();
        fs::write(&path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        info!(path = %path.display(), "Settings saved");
        Ok(())
    }
}
