//! Parley – A line-oriented dialogue-flow DSL and turn-based interpreter
//!
//! This crate implements a small scripting language for conversational
//! flows with:
//! - A shell-style line parser producing a typed script model
//! - Whole-script validation of every jump target before anything runs
//! - A synchronous session driver with pluggable input, intent
//!   resolution, and action dispatch
//! - Variable capture from free-form utterances plus `$var` substitution
//!   in prompts
//! - A ready-made keyword matcher, scripted/stdin input sources, and an
//!   in-memory order-service action set for demos and tests
//! - CLI for checking, inspecting, and running scripts

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Script language: lexer, parser, and the typed script model
pub mod script;

/// Session driver and its collaborator seams
pub mod interpreter;

/// Ready-made collaborators: intent matching, input sources, demo actions
pub mod support;

// Re-export key types for convenience
pub use interpreter::{Environment, RunOutcome, RunReport, Session};
pub use script::{ParseError, Parser, Script, Step, parse_script};

/// Current version of the Parley crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
