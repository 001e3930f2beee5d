//! Settings persistence and how settings reach the runtime components

use std::time::Duration;

use sshdeck_core::transport::OpenSshOptions;
use sshdeck_core::{
    ClientSettings, ConfigError, ConfigManager, ControllerOptions, CredentialResolver,
    RawConnectionRequest, SETTINGS_FILE_NAME, AuthMethod, TracingConfig, TracingLevel,
};
use tempfile::TempDir;

#[test]
fn settings_round_trip_through_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manager = ConfigManager::with_config_dir(temp_dir.path().join("sshdeck"));

    let mut settings = ClientSettings::default();
    settings.connection.default_port = 2222;
    settings.connection.strict_host_key_checking = "yes".to_string();
    settings.execution.command_timeout_secs = 0;
    settings.execution.request_pty = true;
    settings.logging.level = "debug".to_string();
    settings.logging.filter = Some("sshdeck_core=trace".to_string());

    manager.save_settings(&settings).unwrap();
    assert!(temp_dir.path().join("sshdeck").join(SETTINGS_FILE_NAME).exists());

    let loaded = manager.load_settings().unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn hand_written_file_with_unknown_level_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manager = ConfigManager::with_config_dir(temp_dir.path().to_path_buf());
    std::fs::write(
        manager.settings_path(),
        "[logging]\nlevel = \"chatty\"\n",
    )
    .unwrap();

    match manager.load_settings() {
        Err(ConfigError::Validation { field, .. }) => assert_eq!(field, "logging.level"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn settings_drive_controller_transport_and_resolver() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manager = ConfigManager::with_config_dir(temp_dir.path().to_path_buf());
    std::fs::write(
        manager.settings_path(),
        r#"
[connection]
default_port = 2200
connect_timeout_secs = 7
ssh_program = "/opt/ssh/bin/ssh"

[execution]
command_timeout_secs = 30
track_working_directory = false

[logging]
level = "info"
"#,
    )
    .unwrap();
    let settings = manager.load_settings().unwrap();

    let options = ControllerOptions::from_settings(&settings);
    assert_eq!(options.command_timeout, Some(Duration::from_secs(30)));
    assert!(options.connect_timeout.unwrap() > Duration::from_secs(7));

    let transport = OpenSshOptions::from_settings(&settings);
    assert_eq!(transport.ssh_program, "/opt/ssh/bin/ssh");
    assert_eq!(transport.sshpass_program, "sshpass");
    assert_eq!(transport.connect_timeout_secs, 7);
    assert!(!transport.track_working_directory);

    let resolver = CredentialResolver::new().with_default_port(settings.connection.default_port);
    let raw = RawConnectionRequest::new("10.0.0.5", "not-a-port", "root");
    let config = resolver.resolve(&raw, AuthMethod::Password).unwrap();
    assert_eq!(config.port(), 2200);

    let tracing = TracingConfig::from_settings(&settings.logging);
    assert_eq!(tracing.level, TracingLevel::Info);
}
