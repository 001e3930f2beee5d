//! Batch run command.

use std::path::Path;

use sshdeck_core::TranscriptEntry;

use super::Verbosity;
use super::session::{self, OpenSession};
use crate::cli::{ConnectArgs, OutputFormat};
use crate::error::CliError;
use crate::format::{render_entry, transcript_json};
use crate::util::{connection_request, create_runtime, init_logging, load_settings};

/// Parameters for the run command
pub struct RunParams<'a> {
    /// Connection target
    pub target: &'a ConnectArgs,
    /// Commands in submission order
    pub commands: Vec<String>,
    /// Transcript output format
    pub format: OutputFormat,
    /// Stop at the first failed command
    pub fail_fast: bool,
}

/// Run command handler
///
/// Connects, runs every command in order, prints the transcript and
/// disconnects. Text output is printed as each command completes; JSON is
/// printed once at the end.
pub fn cmd_run(
    config_path: Option<&Path>,
    verbosity: Verbosity<'_>,
    params: &RunParams<'_>,
) -> Result<(), CliError> {
    if params.commands.iter().all(|command| command.trim().is_empty()) {
        return Err(CliError::Input(
            "no commands given; use --command or pass them after --".to_string(),
        ));
    }

    let settings = load_settings(config_path)?;
    init_logging(&settings, verbosity);
    let (raw, method) = connection_request(params.target)?;
    let runtime = create_runtime()?;

    runtime.block_on(async {
        let controller = session::build_controller(&settings);
        let open = session::open(controller, &settings, raw, method).await?;

        let transcript = open.controller.transcript();
        if params.format == OutputFormat::Text && !verbosity.quiet {
            if let Some(greeting) = transcript.first() {
                eprint!("{}", render_entry(greeting));
            }
        }

        let outcome = run_commands(&open, params).await;
        // Snapshot before disconnecting; the transcript is cleared on teardown
        let transcript = open.controller.transcript();
        let disconnected = open.controller.disconnect().await;

        if params.format == OutputFormat::Json {
            println!("{}", transcript_json(transcript.iter().map(|entry| &**entry))?);
        }
        outcome?;
        disconnected.map_err(CliError::from)
    })
}

async fn run_commands(open: &OpenSession, params: &RunParams<'_>) -> Result<(), CliError> {
    for command in &params.commands {
        let Some(entry) = open.controller.execute(open.handle.id(), command).await? else {
            continue;
        };
        if params.format == OutputFormat::Text {
            print!("{}", render_entry(&entry));
        }
        if params.fail_fast && !entry.result().success() {
            return Err(CliError::CommandFailed(describe_failure(&entry)));
        }
    }
    Ok(())
}

fn describe_failure(entry: &TranscriptEntry) -> String {
    let command = entry.command_text().unwrap_or_default();
    let result = entry.result();
    if result.is_transport_failure() {
        format!("'{command}': {}", result.stderr.trim())
    } else {
        format!("'{command}' exited with status {}", result.exit_status)
    }
}
