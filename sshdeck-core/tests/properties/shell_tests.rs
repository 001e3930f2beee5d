//! Property tests for remote working-directory tracking

use proptest::prelude::*;
use sshdeck_core::transport::shell::{is_directory_change, parse_directory, plan_command, quote};

/// Directory paths, including ones that need quoting
fn arb_directory() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9 ._'$-]{1,10}", 1..5)
        .prop_map(|parts| format!("/{}", parts.join("/")))
}

/// Plain commands that never start with `cd`
fn arb_plain_command() -> impl Strategy<Value = String> {
    "(ls|cat|echo|uname|df)( [a-z-]{1,6}){0,2}"
}

fn arb_cd_command() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("cd".to_string()),
        "cd [a-z./~-]{1,12}",
    ]
}

/// Undoes [`quote`] the way a POSIX shell would
fn unquote(quoted: &str) -> String {
    quoted
        .strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap()
        .replace(r"'\''", "'")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Quoting is reversible and leaves no bare single quote behind
    #[test]
    fn quote_is_reversible(value in "[ -~]{0,30}") {
        let quoted = quote(&value);
        prop_assert_eq!(unquote(&quoted), value.clone());
        let inner = &quoted[1..quoted.len() - 1];
        prop_assert_eq!(inner.matches('\'').count(), value.matches('\'').count() * 3);
    }

    /// Plain commands run unchanged, prefixed by the tracked directory
    #[test]
    fn plain_commands_keep_their_text(
        directory in proptest::option::of(arb_directory()),
        command in arb_plain_command(),
    ) {
        let plan = plan_command(directory.as_deref(), &format!("  {command} "));
        prop_assert!(!plan.changes_directory);
        match directory {
            Some(dir) => prop_assert_eq!(
                plan.remote_command,
                format!("cd {} && {command}", quote(&dir))
            ),
            None => prop_assert_eq!(plan.remote_command, command),
        }
    }

    /// `cd` commands are detected and end with `pwd`
    #[test]
    fn directory_changes_report_pwd(
        directory in proptest::option::of(arb_directory()),
        command in arb_cd_command(),
    ) {
        prop_assert!(is_directory_change(&command));
        let plan = plan_command(directory.as_deref(), &command);
        prop_assert!(plan.changes_directory);
        let expected_suffix = format!("{command} && pwd");
        prop_assert!(plan.remote_command.ends_with(&expected_suffix));
    }

    /// The last non-blank line of `pwd` output is the directory
    #[test]
    fn parse_directory_takes_last_line(
        noise in prop::collection::vec("[a-z ]{0,10}", 0..4),
        directory in arb_directory(),
    ) {
        let trimmed = directory.trim().to_string();
        let mut stdout = noise.join("\n");
        stdout.push('\n');
        stdout.push_str(&directory);
        stdout.push_str("\n\n");
        prop_assert_eq!(parse_directory(&stdout), Some(trimmed));
    }
}
