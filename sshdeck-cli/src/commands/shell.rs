//! Interactive shell command.

use std::io::{IsTerminal, Write as _};
use std::path::Path;

use sshdeck_core::SessionError;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::Verbosity;
use super::session::{self, OpenSession};
use crate::cli::ConnectArgs;
use crate::error::CliError;
use crate::format::{prompt, render_entry};
use crate::util::{connection_request, create_runtime, init_logging, load_settings};

/// Lines that end the shell instead of being sent
const EXIT_COMMANDS: [&str; 2] = ["exit", "logout"];

/// Shell command handler
///
/// Reads one command per line from standard input. `exit`, `logout`, EOF and
/// Ctrl-C all disconnect.
pub fn cmd_shell(
    config_path: Option<&Path>,
    verbosity: Verbosity<'_>,
    target: &ConnectArgs,
) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    init_logging(&settings, verbosity);
    let (raw, method) = connection_request(target)?;
    let runtime = create_runtime()?;

    runtime.block_on(async {
        let controller = session::build_controller(&settings);
        let open = session::open(controller, &settings, raw, method).await?;
        if let Some(greeting) = open.controller.transcript().first() {
            print!("{}", render_entry(greeting));
        }

        let outcome = read_loop(&open).await;
        let disconnected = open.controller.disconnect().await;
        outcome?;
        disconnected.map_err(CliError::from)
    })
}

async fn read_loop(open: &OpenSession) -> Result<(), CliError> {
    let interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if interactive {
            let directory = open.controller.current_directory();
            eprint!("{}", prompt(&open.handle, directory.as_deref()));
            std::io::stderr().flush()?;
        }

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            return Ok(());
        };
        let command = line.trim();
        if EXIT_COMMANDS.contains(&command) {
            return Ok(());
        }

        let outcome = tokio::select! {
            outcome = open.controller.execute(open.handle.id(), command) => outcome,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Interrupted");
                return Ok(());
            }
        };
        match outcome {
            Ok(Some(entry)) => {
                let rendered = render_entry(&entry);
                // The command echo is redundant when the user just typed it
                let body = if interactive {
                    rendered
                        .split_once('\n')
                        .map_or(rendered.as_str(), |(_, rest)| rest)
                } else {
                    rendered.as_str()
                };
                print!("{body}");
                std::io::stdout().flush()?;
            }
            Ok(None) => {}
            Err(e @ SessionError::SessionLost(_)) => return Err(e.into()),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
}
