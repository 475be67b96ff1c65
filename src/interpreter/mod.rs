//! Session interpreter for parsed scripts.
//!
//! A [`Session`] is a synchronous, single-threaded state machine over one
//! [`crate::script::Script`] and a mutable string-keyed [`Environment`].
//! Everything the conversation needs from the outside world arrives through
//! three narrow seams: an [`InputSource`] for utterances, an
//! [`IntentResolver`] for branch selection, and an [`ActionDispatcher`] for
//! side effects. The session owns the transcript and hands everything back
//! in a [`RunReport`] when the conversation stops.

/// Action dispatch table and its error surface.
pub mod dispatch;
/// Spoken-line template evaluation.
pub mod eval;
/// Input and intent collaborator seams.
pub mod host;
/// Utterance capture into script variables.
pub mod populate;
/// Session driver and run reports.
pub mod session;
/// Append-only record of emitted lines.
pub mod transcript;
/// Environment values.
pub mod value;

pub use dispatch::{ActionDispatcher, ActionError, ActionRegistry, ActionResult};
pub use eval::evaluate;
pub use host::{InputSource, IntentResolver};
pub use populate::populate;
pub use session::{RunOutcome, RunReport, Session};
pub use transcript::{Speaker, Transcript, TranscriptEntry};
pub use value::{Environment, Value};
