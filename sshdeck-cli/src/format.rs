//! Transcript rendering for terminal and JSON output.

use std::fmt::Write as _;

use sshdeck_core::{ResultOrigin, SessionHandle, TranscriptEntry};

use crate::error::CliError;

/// Renders an entry as the user would see it in a terminal
///
/// Commands are echoed with a `$ ` prefix. Failures end with a status line:
/// `[exit N]` for remote failures and `[transport error]` when the command
/// never ran.
pub fn render_entry(entry: &TranscriptEntry) -> String {
    let mut out = String::new();
    if let Some(command) = entry.command_text() {
        let _ = writeln!(out, "$ {command}");
    }

    let result = entry.result();
    push_block(&mut out, &result.stdout);
    push_block(&mut out, &result.stderr);

    match result.origin {
        ResultOrigin::Transport => out.push_str("[transport error]\n"),
        ResultOrigin::Remote if result.exit_status != 0 => {
            let _ = writeln!(out, "[exit {}]", result.exit_status);
        }
        ResultOrigin::Remote | ResultOrigin::Local => {}
    }
    out
}

fn push_block(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}

/// Prompt shown by the shell command, e.g. `root@10.0.0.5:/srv$ `
pub fn prompt(handle: &SessionHandle, directory: Option<&str>) -> String {
    let info = handle.info();
    format!(
        "{}@{}:{}$ ",
        info.username,
        info.host,
        directory.unwrap_or("~")
    )
}

/// Serializes entries as a pretty-printed JSON array
pub fn transcript_json<'a>(
    entries: impl IntoIterator<Item = &'a TranscriptEntry>,
) -> Result<String, CliError> {
    let entries: Vec<&TranscriptEntry> = entries.into_iter().collect();
    serde_json::to_string_pretty(&entries)
        .map_err(|e| CliError::Output(format!("Failed to serialize transcript: {e}")))
}
