//! Settings file command.

use std::path::Path;

use sshdeck_core::ClientSettings;

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::util::create_config_manager;

/// Config command handler
pub fn cmd_config(config_path: Option<&Path>, subcommand: ConfigCommands) -> Result<(), CliError> {
    let config_manager = create_config_manager(config_path)?;

    match subcommand {
        ConfigCommands::Show => {
            let settings = config_manager
                .load_settings()
                .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;
            let text = toml::to_string_pretty(&settings)
                .map_err(|e| CliError::Output(format!("Failed to render settings: {e}")))?;
            print!("{text}");
        }
        ConfigCommands::Path => {
            println!("{}", config_manager.settings_path().display());
        }
        ConfigCommands::Init { force } => {
            let path = config_manager.settings_path();
            if path.exists() && !force {
                return Err(CliError::Config(format!(
                    "{} already exists; use --force to overwrite",
                    path.display()
                )));
            }
            config_manager.save_settings(&ClientSettings::default())?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
