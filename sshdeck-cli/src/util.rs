//! Shared utility functions used across command modules.

use std::path::Path;

use sshdeck_core::config::ConfigManager;
use sshdeck_core::{
    AuthMethod, ClientSettings, RawConnectionRequest, TracingConfig, TracingError, TracingLevel,
    TracingOutput, init_tracing,
};

use crate::cli::ConnectArgs;
use crate::commands::Verbosity;
use crate::error::CliError;

/// Environment variable holding the login password
pub const PASSWORD_ENV: &str = "SSHDECK_PASSWORD";

/// Environment variable holding the private key passphrase
pub const PASSPHRASE_ENV: &str = "SSHDECK_PASSPHRASE";

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads settings, falling back to defaults when no file exists
pub fn load_settings(config_path: Option<&Path>) -> Result<ClientSettings, CliError> {
    create_config_manager(config_path)?
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))
}

/// Builds the subscriber configuration for a session command
///
/// `-q` limits logging to errors and each `-v` raises the configured level
/// by one step. A custom `filter` in the settings wins over both.
pub fn logging_config(settings: &ClientSettings, verbosity: Verbosity<'_>) -> TracingConfig {
    let base = TracingConfig::from_settings(&settings.logging);
    let level = if verbosity.quiet {
        TracingLevel::Error
    } else {
        base.level.raised_by(verbosity.verbose)
    };
    let config = base.with_level(level);
    match verbosity.log_file {
        Some(path) => config.with_output(TracingOutput::File(path.to_path_buf())),
        None => config,
    }
}

/// Installs the log subscriber for a session command
pub fn init_logging(settings: &ClientSettings, verbosity: Verbosity<'_>) {
    match init_tracing(&logging_config(settings, verbosity)) {
        Ok(()) | Err(TracingError::AlreadyInitialized) => {}
        Err(e) => eprintln!("Warning: {e}"),
    }
}

/// Creates the tokio runtime that drives a session
pub fn create_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new().map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Reads a secret from `env_var`, or prompts for it without echo
pub fn read_secret(env_var: &str, prompt: &str) -> Result<String, CliError> {
    if let Ok(value) = std::env::var(env_var) {
        return Ok(value);
    }
    eprint!("{prompt}");
    rpassword::read_password().map_err(|e| CliError::Input(format!("Failed to read secret: {e}")))
}

/// Collects the raw connect request from arguments, environment and prompts
///
/// Only the secret relevant to the selected method is read.
pub fn connection_request(
    args: &ConnectArgs,
) -> Result<(RawConnectionRequest, AuthMethod), CliError> {
    let method = AuthMethod::from(args.auth);
    let mut raw = RawConnectionRequest::new(
        args.host.as_str(),
        args.port.clone().unwrap_or_default(),
        args.user.as_str(),
    );

    match method {
        AuthMethod::Password => {
            raw.password = read_secret(
                PASSWORD_ENV,
                &format!("Password for {}@{}: ", args.user, args.host),
            )?;
        }
        AuthMethod::Key => {
            raw.identity_path = args.identity.clone().unwrap_or_default();
            if args.ask_passphrase || std::env::var_os(PASSPHRASE_ENV).is_some() {
                raw.passphrase = read_secret(PASSPHRASE_ENV, "Key passphrase: ")?;
            }
        }
    }

    Ok((raw, method))
}
