//! Remote working-directory tracking
//!
//! Every command runs in a fresh remote shell, so `cd` would otherwise be
//! lost between commands. Commands are rewritten to start in the tracked
//! directory, and `cd` commands report the directory they end up in.

/// How a user command is sent to the remote shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    /// Command line passed to the remote shell
    pub remote_command: String,
    /// True if stdout is the new working directory rather than user output
    pub changes_directory: bool,
}

/// Returns true for `cd` and `cd <args>`
#[must_use]
pub fn is_directory_change(command: &str) -> bool {
    let trimmed = command.trim();
    trimmed == "cd" || trimmed.starts_with("cd ") || trimmed.starts_with("cd\t")
}

/// Wraps `value` in single quotes for a POSIX shell
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Builds the remote command line for `command`
///
/// With a tracked directory the command starts there. A `cd` is followed by
/// `pwd` so the caller can learn the resulting directory.
#[must_use]
pub fn plan_command(current_directory: Option<&str>, command: &str) -> CommandPlan {
    let command = command.trim();
    let prefix = current_directory
        .filter(|dir| !dir.is_empty())
        .map(|dir| format!("cd {} && ", quote(dir)))
        .unwrap_or_default();

    if is_directory_change(command) {
        CommandPlan {
            remote_command: format!("{prefix}{command} && pwd"),
            changes_directory: true,
        }
    } else {
        CommandPlan {
            remote_command: format!("{prefix}{command}"),
            changes_directory: false,
        }
    }
}

/// Extracts the directory printed by `pwd`
#[must_use]
pub fn parse_directory(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_string)
}
