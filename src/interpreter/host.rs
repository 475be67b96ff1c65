//! Collaborator seams a session pulls on while it runs.
//!
//! Implementations live with the host application; the crate ships
//! reference versions in [`crate::support`].

/// Supplies one utterance per listen phase.
pub trait InputSource {
    /// Next utterance from the user.
    ///
    /// `None` signals the input is closed and ends the run immediately; an
    /// empty string is a silent turn and routes through the step's silence
    /// fallback.
    fn next_utterance(&mut self) -> Option<String>;
}

/// Maps a free-form utterance onto one of a step's branch labels.
pub trait IntentResolver {
    /// Pick a label for `utterance` from `labels`, or `None` when nothing
    /// matches.
    ///
    /// Labels arrive in the step's declaration order and the returned label
    /// must be one of them, verbatim; the session re-checks membership
    /// before jumping.
    fn resolve(&self, utterance: &str, labels: &[&str]) -> Option<String>;
}
