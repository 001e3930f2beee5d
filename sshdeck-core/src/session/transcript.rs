//! Append-only transcript of one session

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{SessionError, SessionResult};
use crate::models::CommandResult;

/// What a transcript entry records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "command", rename_all = "snake_case")]
pub enum EntryKind {
    /// Synthetic marker appended when the connection is established
    Greeting,
    /// A submitted command, trimmed
    Command(String),
}

/// One immutable transcript record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    sequence: u64,
    #[serde(flatten)]
    kind: EntryKind,
    result: CommandResult,
    timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    /// Creates the greeting entry
    #[must_use]
    pub fn greeting(sequence: u64, text: impl Into<String>) -> Self {
        Self {
            sequence,
            kind: EntryKind::Greeting,
            result: CommandResult::greeting(text),
            timestamp: Utc::now(),
        }
    }

    /// Creates the entry for a command and its result
    #[must_use]
    pub fn command(sequence: u64, command: impl Into<String>, result: CommandResult) -> Self {
        Self {
            sequence,
            kind: EntryKind::Command(command.into()),
            result,
            timestamp: Utc::now(),
        }
    }

    /// Submission sequence number
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Entry kind
    #[must_use]
    pub const fn kind(&self) -> &EntryKind {
        &self.kind
    }

    /// Command text, `None` for the greeting
    #[must_use]
    pub fn command_text(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Command(text) => Some(text),
            EntryKind::Greeting => None,
        }
    }

    /// Returns true for the connection greeting
    #[must_use]
    pub const fn is_greeting(&self) -> bool {
        matches!(self.kind, EntryKind::Greeting)
    }

    /// Command outcome
    #[must_use]
    pub const fn result(&self) -> &CommandResult {
        &self.result
    }

    /// When the entry was recorded
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Ordered, append-only log of [`TranscriptEntry`] values
///
/// Entries are stored behind `Arc` so snapshots handed to a display layer are
/// cheap and can never be mutated.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Arc<TranscriptEntry>>,
}

impl Transcript {
    /// Creates an empty transcript
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry and returns the shared copy
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::OutOfOrder`] if the entry's sequence number
    /// does not exceed the last stored one.
    pub fn append(&mut self, entry: TranscriptEntry) -> SessionResult<Arc<TranscriptEntry>> {
        if let Some(last) = self.entries.last() {
            if entry.sequence <= last.sequence {
                return Err(SessionError::OutOfOrder {
                    last: last.sequence,
                    got: entry.sequence,
                });
            }
        }
        let entry = Arc::new(entry);
        self.entries.push(Arc::clone(&entry));
        Ok(entry)
    }

    /// Iterates entries in submission order
    ///
    /// Each call starts from the first entry.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TranscriptEntry> + '_ {
        self.entries.iter().map(|entry| &**entry)
    }

    /// Clones the entry handles for use outside the owning lock
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<TranscriptEntry>> {
        self.entries.clone()
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last().map(|entry| &**entry)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
