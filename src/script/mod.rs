//! The script language: lexing, data model, and parsing.
//!
//! Scripts are line-oriented. Each line is split with shell-style quoting
//! rules and dispatched on its first token (`Step`, `Speak`, `Listen`,
//! `Branch`, `Silence`, `Default`, `Action`, `Exit`). Parsing is fail-fast
//! and finishes with a whole-script reference check, so a [`Script`] handed
//! to the interpreter never contains a dangling jump target.

/// Script data model.
pub mod ast;
/// Shell-style line tokenizer.
pub mod lexer;
/// Line-keyword parser and script validation.
pub mod parser;

pub use ast::{
    ActionInvocation, Branch, Expression, ExpressionItem, Guard, Listen, Script, Step,
};
pub use lexer::{LexError, tidy, tokenize};
pub use parser::{DEFAULT_GUARD_BINDINGS, Parser, parse_script};

use thiserror::Error;

/// Convenience result alias for script parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors surfaced while assembling a script.
///
/// Parsing aborts on the first error. Line numbers are 1-based and refer to
/// the raw source text, comments and blank lines included.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A line could not be split into tokens.
    #[error("line {line}: {source}")]
    Tokenization {
        /// Source line that failed to tokenize.
        line: usize,
        /// Underlying lexer failure.
        #[source]
        source: LexError,
    },

    /// A `Step` line carried no identifier.
    #[error("line {line}: Step requires an identifier")]
    StepMissingId {
        /// Offending source line.
        line: usize,
    },

    /// Two steps were declared under the same identifier.
    #[error("line {line}: duplicate step id '{id}'")]
    DuplicateStepId {
        /// Offending source line.
        line: usize,
        /// Identifier declared twice.
        id: String,
    },

    /// `Speak` appeared before any `Step`.
    #[error("line {line}: Speak outside of a step")]
    SpeakOutsideStep {
        /// Offending source line.
        line: usize,
    },

    /// `Action` appeared before any `Step`.
    #[error("line {line}: Action outside of a step")]
    ActionOutsideStep {
        /// Offending source line.
        line: usize,
    },

    /// Any other step directive appeared before any `Step`.
    #[error("line {line}: {keyword} outside of a step")]
    DirectiveOutsideStep {
        /// Offending source line.
        line: usize,
        /// Directive keyword found.
        keyword: String,
    },

    /// The first token of a line is not a known keyword.
    #[error("line {line}: unknown keyword '{keyword}'")]
    UnknownKeyword {
        /// Offending source line.
        line: usize,
        /// Token that failed keyword dispatch.
        keyword: String,
    },

    /// A directive is missing (or cannot parse) required arguments.
    #[error("line {line}: {keyword} requires {expected}")]
    MissingArguments {
        /// Offending source line.
        line: usize,
        /// Directive keyword.
        keyword: &'static str,
        /// Description of the arguments expected.
        expected: &'static str,
    },

    /// A branch, silence, or default target names no declared step.
    #[error("step '{step}' references undefined step '{target}'")]
    UndefinedReference {
        /// Step holding the dangling reference.
        step: String,
        /// Target id that was never declared.
        target: String,
    },
}
