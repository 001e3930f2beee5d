//! Transport backed by the system OpenSSH client
//!
//! Connecting starts a ControlMaster process (`ssh -M -N -f -S <socket>`)
//! that holds the authenticated connection. Each command then runs as a
//! short-lived `ssh -S <socket>` client multiplexed over that master, and
//! disconnecting sends `-O exit` to it. Password and passphrase
//! authentication go through `sshpass -e` so the secret never appears on a
//! command line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::shell::{self, CommandPlan};
use super::{ConnectResponse, ExecOutput, SshTransport};
use crate::config::ClientSettings;
use crate::error::{TransportError, TransportResult};
use crate::models::{AuthPayload, ConnectionConfig, SessionId};

/// Exit status `ssh` uses for its own errors
const SSH_ERROR_EXIT_STATUS: i32 = 255;

/// Extra time granted to the master process beyond `ConnectTimeout`
const MASTER_STARTUP_GRACE_SECS: u64 = 30;

/// Length of the session id prefix used in control socket names
///
/// Unix socket paths are limited to roughly 100 bytes.
const SOCKET_NAME_LEN: usize = 12;

/// Options for [`OpenSshTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSshOptions {
    /// `ssh` executable
    pub ssh_program: String,
    /// `sshpass` executable, used for password and passphrase auth
    pub sshpass_program: String,
    /// Directory holding the ControlMaster sockets
    pub control_dir: PathBuf,
    /// Value for `StrictHostKeyChecking`
    pub strict_host_key_checking: String,
    /// Value for `ConnectTimeout`, in seconds
    pub connect_timeout_secs: u64,
    /// Keep track of the remote working directory across commands
    pub track_working_directory: bool,
    /// Allocate a pseudo-terminal for each command (merges stderr into stdout)
    pub request_pty: bool,
}

impl Default for OpenSshOptions {
    fn default() -> Self {
        Self {
            ssh_program: "ssh".to_string(),
            sshpass_program: "sshpass".to_string(),
            control_dir: std::env::temp_dir().join("sshdeck"),
            strict_host_key_checking: "accept-new".to_string(),
            connect_timeout_secs: 15,
            track_working_directory: true,
            request_pty: false,
        }
    }
}

impl OpenSshOptions {
    /// Builds transport options from user settings
    #[must_use]
    pub fn from_settings(settings: &ClientSettings) -> Self {
        let defaults = Self::default();
        Self {
            ssh_program: settings.connection.ssh_program.clone(),
            sshpass_program: settings.connection.sshpass_program.clone(),
            control_dir: settings
                .connection
                .control_dir
                .clone()
                .unwrap_or(defaults.control_dir),
            strict_host_key_checking: settings.connection.strict_host_key_checking.clone(),
            connect_timeout_secs: settings.connection.connect_timeout_secs,
            track_working_directory: settings.execution.track_working_directory,
            request_pty: settings.execution.request_pty,
        }
    }
}

/// One running ControlMaster
#[derive(Debug, Clone)]
struct MasterConnection {
    host: String,
    port: u16,
    username: String,
    control_path: PathBuf,
    working_directory: Option<String>,
}

/// [`SshTransport`] implementation driving the `ssh` binary
pub struct OpenSshTransport {
    options: OpenSshOptions,
    sessions: Mutex<HashMap<SessionId, MasterConnection>>,
}

impl OpenSshTransport {
    /// Creates a transport with the given options
    #[must_use]
    pub fn new(options: OpenSshOptions) -> Self {
        Self {
            options,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Transport options
    #[must_use]
    pub const fn options(&self) -> &OpenSshOptions {
        &self.options
    }

    /// Number of masters this transport currently owns
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, MasterConnection>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn control_path(&self, session_id: &SessionId) -> PathBuf {
        let name: String = session_id.as_str().chars().take(SOCKET_NAME_LEN).collect();
        self.options.control_dir.join(format!("{name}.sock"))
    }

    /// Builds the ControlMaster command for a connect attempt
    fn master_command(&self, config: &ConnectionConfig, control_path: &Path) -> Command {
        let mut cmd = match config.auth() {
            AuthPayload::Password { password } => {
                let mut cmd = Command::new(&self.options.sshpass_program);
                cmd.arg("-e").arg(&self.options.ssh_program);
                cmd.env("SSHPASS", password.expose_secret());
                cmd.arg("-o")
                    .arg("PreferredAuthentications=password,keyboard-interactive");
                cmd.arg("-o").arg("PubkeyAuthentication=no");
                cmd
            }
            AuthPayload::Identity {
                identity_path,
                passphrase: Some(passphrase),
            } => {
                let mut cmd = Command::new(&self.options.sshpass_program);
                cmd.arg("-P").arg("passphrase").arg("-e");
                cmd.arg(&self.options.ssh_program);
                cmd.env("SSHPASS", passphrase.expose_secret());
                cmd.arg("-i").arg(identity_path);
                cmd.arg("-o").arg("IdentitiesOnly=yes");
                cmd
            }
            AuthPayload::Identity {
                identity_path,
                passphrase: None,
            } => {
                let mut cmd = Command::new(&self.options.ssh_program);
                cmd.arg("-o").arg("BatchMode=yes");
                cmd.arg("-i").arg(identity_path);
                cmd.arg("-o").arg("IdentitiesOnly=yes");
                cmd
            }
        };

        cmd.arg("-M").arg("-N").arg("-f");
        cmd.arg("-S").arg(control_path);
        cmd.arg("-o").arg(format!(
            "StrictHostKeyChecking={}",
            self.options.strict_host_key_checking
        ));
        cmd.arg("-o")
            .arg(format!("ConnectTimeout={}", self.options.connect_timeout_secs));
        cmd.arg("-o").arg("ServerAliveInterval=15");
        cmd.arg("-p").arg(config.port().to_string());
        cmd.arg("-l").arg(config.username());
        cmd.arg("--").arg(config.host());

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Builds an `ssh` command multiplexed over an existing master
    fn client_command(&self, master: &MasterConnection) -> Command {
        let mut cmd = Command::new(&self.options.ssh_program);
        cmd.arg("-S").arg(&master.control_path);
        cmd.arg("-o").arg("ControlMaster=no");
        cmd.arg("-o").arg("BatchMode=yes");
        cmd.arg("-p").arg(master.port.to_string());
        cmd.arg("-l").arg(&master.username);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run_remote(&self, master: &MasterConnection, remote_command: &str) -> TransportResult<Output> {
        let mut cmd = self.client_command(master);
        cmd.arg(if self.options.request_pty { "-tt" } else { "-T" });
        cmd.arg("--").arg(&master.host).arg(remote_command);
        cmd.output()
            .await
            .map_err(|e| spawn_error(&self.options.ssh_program, &e))
    }

    /// Sends a control request (`check`, `exit`) to the master
    async fn control(&self, master: &MasterConnection, request: &str) -> TransportResult<Output> {
        let mut cmd = self.client_command(master);
        cmd.arg("-O").arg(request);
        cmd.arg("--").arg(&master.host);
        cmd.output()
            .await
            .map_err(|e| spawn_error(&self.options.ssh_program, &e))
    }

    async fn master_alive(&self, master: &MasterConnection) -> bool {
        self.control(master, "check")
            .await
            .is_ok_and(|output| output.status.success())
    }

    async fn start_master(&self, config: &ConnectionConfig, control_path: &Path) -> TransportResult<Output> {
        let program = match config.auth() {
            AuthPayload::Identity {
                passphrase: None, ..
            } => &self.options.ssh_program,
            _ => &self.options.sshpass_program,
        };
        let limit =
            Duration::from_secs(self.options.connect_timeout_secs + MASTER_STARTUP_GRACE_SECS);
        let mut cmd = self.master_command(config, control_path);

        match tokio::time::timeout(limit, cmd.output()).await {
            Ok(result) => result.map_err(|e| spawn_error(program, &e)),
            Err(_) => Err(TransportError::Timeout(limit)),
        }
    }
}

impl Default for OpenSshTransport {
    fn default() -> Self {
        Self::new(OpenSshOptions::default())
    }
}

#[async_trait]
impl SshTransport for OpenSshTransport {
    async fn connect(&self, config: &ConnectionConfig) -> TransportResult<ConnectResponse> {
        tokio::fs::create_dir_all(&self.options.control_dir).await?;

        let session_id = SessionId::generate();
        let mut master = MasterConnection {
            host: config.host().to_string(),
            port: config.port(),
            username: config.username().to_string(),
            control_path: self.control_path(&session_id),
            working_directory: None,
        };

        let output = self.start_master(config, &master.control_path).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(status = %output.status, "ControlMaster exited with failure");
            return Ok(ConnectResponse::rejected(format!(
                "Failed to establish SSH connection: {}",
                stderr.trim()
            )));
        }

        // The master is detached (`-f`); every exit below stops it unless disarmed
        let pending = PendingMaster::new(&self.options.ssh_program, master.clone());

        if self.options.track_working_directory {
            let limit = Duration::from_secs(self.options.connect_timeout_secs);
            let output = match tokio::time::timeout(limit, self.run_remote(&master, "pwd")).await {
                Ok(result) => result?,
                Err(_) => return Err(TransportError::Timeout(limit)),
            };
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                return Ok(ConnectResponse::rejected(format!(
                    "Failed to read initial working directory: {stderr}"
                )));
            }
            master.working_directory =
                shell::parse_directory(&String::from_utf8_lossy(&output.stdout));
        }

        pending.disarm();
        let directory = master.working_directory.clone();
        info!(
            session_id = %session_id,
            host = %master.host,
            port = master.port,
            "ControlMaster started"
        );
        self.sessions().insert(session_id.clone(), master);

        Ok(
            ConnectResponse::connected(session_id, "Successfully connected and authenticated")
                .with_current_directory(directory),
        )
    }

    async fn execute(&self, session_id: &SessionId, command: &str) -> TransportResult<ExecOutput> {
        let master = self
            .sessions()
            .get(session_id)
            .cloned()
            .ok_or_else(|| TransportError::UnknownSession(session_id.to_string()))?;

        let plan = if self.options.track_working_directory {
            shell::plan_command(master.working_directory.as_deref(), command)
        } else {
            CommandPlan {
                remote_command: command.trim().to_string(),
                changes_directory: false,
            }
        };

        let output = self.run_remote(&master, &plan.remote_command).await?;
        let Some(exit_status) = output.status.code() else {
            return Err(TransportError::ConnectionLost(
                "ssh client was terminated by a signal".to_string(),
            ));
        };
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if exit_status == SSH_ERROR_EXIT_STATUS && !self.master_alive(&master).await {
            warn!(session_id = %session_id, "ControlMaster is gone");
            return Err(TransportError::ConnectionLost(stderr.trim().to_string()));
        }

        let mut directory = master.working_directory;
        let stdout = if plan.changes_directory && exit_status == 0 {
            if let Some(new_directory) = shell::parse_directory(&stdout) {
                if let Some(entry) = self.sessions().get_mut(session_id) {
                    entry.working_directory = Some(new_directory.clone());
                }
                directory = Some(new_directory);
            }
            String::new()
        } else {
            stdout
        };

        Ok(ExecOutput::new(stdout, stderr, exit_status).with_current_directory(directory))
    }

    async fn disconnect(&self, session_id: &SessionId) -> TransportResult<()> {
        let master = self
            .sessions()
            .remove(session_id)
            .ok_or_else(|| TransportError::UnknownSession(session_id.to_string()))?;

        let output = self.control(&master, "exit").await;

        if let Err(e) = tokio::fs::remove_file(&master.control_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(%e, path = %master.control_path.display(), "Failed to remove control socket");
            }
        }

        let output = output?;
        if output.status.success() {
            info!(session_id = %session_id, "ControlMaster stopped");
            Ok(())
        } else {
            Err(TransportError::ConnectionLost(format!(
                "Failed to stop control master: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

impl Drop for OpenSshTransport {
    fn drop(&mut self) {
        let sessions = std::mem::take(
            self.sessions
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for (session_id, master) in sessions {
            let status = stop_master_blocking(&self.options.ssh_program, &master);
            debug!(session_id = %session_id, ?status, "Stopped leftover ControlMaster");
        }
    }
}

/// A started master that no session owns yet
///
/// Dropping it stops the master, which covers failed `pwd` reads, timeouts
/// and connect futures abandoned by the caller.
struct PendingMaster<'a> {
    ssh_program: &'a str,
    master: Option<MasterConnection>,
}

impl<'a> PendingMaster<'a> {
    const fn new(ssh_program: &'a str, master: MasterConnection) -> Self {
        Self {
            ssh_program,
            master: Some(master),
        }
    }

    /// Hands the master over to the session table
    fn disarm(mut self) {
        self.master = None;
    }
}

impl Drop for PendingMaster<'_> {
    fn drop(&mut self) {
        if let Some(master) = self.master.take() {
            let status = stop_master_blocking(self.ssh_program, &master);
            debug!(host = %master.host, ?status, "Stopped master of an unfinished connect");
        }
    }
}

/// Sends `-O exit` without an async runtime and removes the socket
fn stop_master_blocking(
    ssh_program: &str,
    master: &MasterConnection,
) -> std::io::Result<std::process::ExitStatus> {
    let status = std::process::Command::new(ssh_program)
        .arg("-S")
        .arg(&master.control_path)
        .arg("-O")
        .arg("exit")
        .arg("--")
        .arg(&master.host)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = std::fs::remove_file(&master.control_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(%e, path = %master.control_path.display(), "Failed to remove control socket");
        }
    }
    status
}

fn spawn_error(program: &str, err: &std::io::Error) -> TransportError {
    TransportError::Spawn {
        program: program.to_string(),
        reason: err.to_string(),
    }
}
