//! Input sources for scripted and interactive sessions.

use crate::interpreter::InputSource;
use std::collections::VecDeque;
use std::io::{self, BufRead};
use tracing::warn;

/// A fixed queue of turns, used by tests and batch runs.
///
/// Empty strings model silent turns; once the queue runs out the source
/// reports closed and the session ends with an input-closed outcome.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    turns: VecDeque<String>,
}

impl ScriptedInput {
    /// Queue up `turns` in order.
    pub fn new(turns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            turns: turns.into_iter().map(|turn| turn.into()).collect(),
        }
    }

    /// Turns still waiting to be consumed.
    pub fn remaining(&self) -> usize {
        self.turns.len()
    }
}

impl InputSource for ScriptedInput {
    fn next_utterance(&mut self) -> Option<String> {
        self.turns.pop_front()
    }
}

/// Reads one utterance per line from standard input.
///
/// End of file closes the source. Interactive lines are trimmed, so a
/// whitespace-only line comes through as an empty utterance and takes the
/// silence fallback rather than the intent path.
pub struct StdinInput {
    lines: io::Lines<io::StdinLock<'static>>,
}

impl StdinInput {
    /// Locks stdin for the lifetime of the source.
    pub fn new() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for StdinInput {
    fn next_utterance(&mut self) -> Option<String> {
        interactive_turn(self.lines.next())
    }
}

fn interactive_turn(line: Option<io::Result<String>>) -> Option<String> {
    match line {
        Some(Ok(line)) => Some(line.trim().to_string()),
        Some(Err(err)) => {
            warn!(%err, "stdin read failed");
            None
        }
        None => None,
    }
}
