//! Append-only record of everything a session emits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    /// Evaluated `Speak` output.
    Bot,
    /// Interpreter notices: conversation endings, skipped actions.
    System,
}

/// One emitted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Line producer.
    pub speaker: Speaker,
    /// Emitted text.
    pub text: String,
}

/// Ordered collection of emitted lines.
///
/// Entries appear in emission order and are never rewritten, so substring
/// assertions against a finished run are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            text: text.into(),
        });
    }

    /// All entries in emission order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Bot lines only, in emission order.
    pub fn bot_lines(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| entry.speaker == Speaker::Bot)
            .map(|entry| entry.text.as_str())
    }

    /// True when any entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|entry| entry.text.contains(needle))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match entry.speaker {
                Speaker::Bot => writeln!(f, "BOT: {}", entry.text)?,
                Speaker::System => writeln!(f, "[{}]", entry.text)?,
            }
        }
        Ok(())
    }
}
