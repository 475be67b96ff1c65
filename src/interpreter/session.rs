//! Session driver: one conversation over one parsed script.

use super::dispatch::{ActionDispatcher, ActionError};
use super::eval::evaluate;
use super::host::{InputSource, IntentResolver};
use super::populate::populate;
use super::transcript::{Speaker, Transcript};
use super::value::Environment;
use crate::script::Script;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Why a session stopped.
///
/// Ended conversations are data, not errors; only
/// [`RunOutcome::UnresolvedStep`] indicates a broken script, and even that
/// comes back inside a [`RunReport`] so the accumulated environment stays
/// available for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// A step marked `Exit` completed.
    Exit,
    /// The input source closed mid-conversation.
    InputClosed,
    /// Empty utterance with no silence or default fallback.
    SilenceNoFallback,
    /// No branch matched and no default fallback existed.
    NoMatch,
    /// A step without listen or default ended the flow.
    DeadEnd,
    /// The script declares no steps.
    EmptyScript,
    /// A jump named a step the script does not contain.
    UnresolvedStep(String),
}

impl RunOutcome {
    /// True for outcomes that indicate a broken script rather than a
    /// finished conversation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunOutcome::UnresolvedStep(_))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Exit => f.write_str("exit-step"),
            RunOutcome::InputClosed => f.write_str("end-of-input"),
            RunOutcome::SilenceNoFallback => f.write_str("silence-no-fallback"),
            RunOutcome::NoMatch => f.write_str("no-branch-no-default"),
            RunOutcome::DeadEnd => f.write_str("dead-end"),
            RunOutcome::EmptyScript => f.write_str("empty-script"),
            RunOutcome::UnresolvedStep(id) => write!(f, "unresolved-step {id}"),
        }
    }
}

/// Everything a finished session hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id of this run; also carried on the session's tracing span.
    pub run_id: Uuid,
    /// UTC time the session started.
    pub started_at: DateTime<Utc>,
    /// UTC time the session stopped.
    pub finished_at: DateTime<Utc>,
    /// Why the session stopped.
    pub outcome: RunOutcome,
    /// Final variable store.
    pub env: Environment,
    /// Everything emitted, in emission order.
    pub transcript: Transcript,
}

/// One conversation in flight.
///
/// The session borrows its collaborators for the duration of the run and
/// owns the environment and transcript. Each step passes through the same
/// phases in order: speak, exit check, listen, actions, branch override,
/// jump, fallback.
pub struct Session<'a> {
    script: &'a Script,
    actions: &'a mut dyn ActionDispatcher,
    intents: &'a dyn IntentResolver,
    input: &'a mut dyn InputSource,
    echo: Option<&'a mut dyn Write>,
    env: Environment,
    transcript: Transcript,
    run_id: Uuid,
}

impl<'a> Session<'a> {
    /// Session over `script` with the given collaborators.
    pub fn new(
        script: &'a Script,
        actions: &'a mut dyn ActionDispatcher,
        intents: &'a dyn IntentResolver,
        input: &'a mut dyn InputSource,
    ) -> Self {
        Self {
            script,
            actions,
            intents,
            input,
            echo: None,
            env: Environment::new(),
            transcript: Transcript::new(),
            run_id: Uuid::new_v4(),
        }
    }

    /// Mirror every emitted line to `sink` as it happens.
    ///
    /// Interactive hosts pass stdout here so prompts appear before the
    /// input source blocks on the user.
    pub fn with_echo(mut self, sink: &'a mut dyn Write) -> Self {
        self.echo = Some(sink);
        self
    }

    /// Start from a pre-seeded environment instead of an empty one.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Drive the conversation to completion.
    pub fn run(mut self) -> RunReport {
        let span = tracing::info_span!("session", run_id = %self.run_id);
        let _guard = span.enter();
        let started_at = Utc::now();
        info!(steps = self.script.len(), "session started");

        let outcome = self.drive();
        if outcome.is_fatal() {
            error!(%outcome, "session aborted");
        } else {
            info!(%outcome, "session finished");
        }

        RunReport {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            outcome,
            env: self.env,
            transcript: self.transcript,
        }
    }

    fn drive(&mut self) -> RunOutcome {
        let script = self.script;
        let Some(entry) = script.entry.clone() else {
            self.notice("Script has no entry step.");
            return RunOutcome::EmptyScript;
        };

        let mut cursor = entry;
        let mut pending: Option<String> = None;

        loop {
            let Some(step) = script.step(&cursor) else {
                self.notice(&format!("No such step: {cursor}"));
                return RunOutcome::UnresolvedStep(cursor);
            };
            debug!(step = %step.id, "entering step");

            // Speak.
            if let Some(expression) = &step.speak {
                let text = evaluate(expression, &self.env);
                info!(step = %step.id, line = %text, "speak");
                self.say(text);
            }

            // Exit.
            if step.is_exit {
                self.notice("Conversation ended by script.");
                return RunOutcome::Exit;
            }

            // Listen.
            if step.listen.is_some() {
                let Some(utterance) = self.input.next_utterance() else {
                    info!(step = %step.id, "input closed");
                    return RunOutcome::InputClosed;
                };

                if utterance.is_empty() {
                    pending = step.silence.clone().or_else(|| step.default.clone());
                    if pending.is_none() {
                        self.notice("No input and no fallback; conversation ends.");
                        return RunOutcome::SilenceNoFallback;
                    }
                } else {
                    self.env.set(Environment::LAST_INPUT, utterance.clone());
                    populate(&mut self.env, &script.vars, &utterance);

                    let labels: Vec<&str> = step
                        .branches
                        .iter()
                        .map(|branch| branch.label.as_str())
                        .collect();
                    let intent = self.intents.resolve(&utterance, &labels);
                    debug!(step = %step.id, ?intent, "intent resolved");

                    let target = intent
                        .as_deref()
                        .and_then(|label| step.branch_target(label));
                    match target {
                        Some(target) => pending = Some(target.to_string()),
                        None => match &step.default {
                            Some(target) => pending = Some(target.clone()),
                            None => {
                                self.notice("No matching branch; conversation ends.");
                                return RunOutcome::NoMatch;
                            }
                        },
                    }
                }
            }

            // Actions, then the branch override they may have unlocked.
            if !step.actions.is_empty() {
                let utterance = self.env.render(Environment::LAST_INPUT);
                for call in &step.actions {
                    match self.actions.invoke(call, &mut self.env, &utterance) {
                        Ok(()) => {}
                        Err(err @ ActionError::Unknown { .. }) => {
                            error!(step = %step.id, %err, "action skipped");
                            self.notice(&err.to_string());
                        }
                        Err(err) => {
                            warn!(step = %step.id, %err, "action failed");
                        }
                    }
                }

                // At most one guard is consulted per step; when its key is
                // truthy the guarded branch wins over the listen-phase jump.
                if let Some(guard) = step.guards.first() {
                    if self.env.truthy(&guard.key) {
                        if let Some(target) = step.branch_target(&guard.label) {
                            debug!(
                                step = %step.id,
                                label = %guard.label,
                                key = %guard.key,
                                "guard override"
                            );
                            pending = Some(target.to_string());
                        }
                    }
                }
            }

            // Jump.
            if let Some(target) = pending.take() {
                debug!(from = %step.id, to = %target, "jump");
                cursor = target;
                continue;
            }

            // Steps without a listen phase fall through to their default.
            if step.listen.is_none() {
                if let Some(target) = &step.default {
                    cursor = target.clone();
                    continue;
                }
                self.notice("No listen and no default; conversation ends.");
                return RunOutcome::DeadEnd;
            }
        }
    }

    fn say(&mut self, text: String) {
        if let Some(echo) = self.echo.as_mut() {
            let _ = writeln!(echo, "BOT: {text}");
        }
        self.transcript.push(Speaker::Bot, text);
    }

    fn notice(&mut self, text: &str) {
        debug!(notice = %text, "system notice");
        if let Some(echo) = self.echo.as_mut() {
            let _ = writeln!(echo, "[{text}]");
        }
        self.transcript.push(Speaker::System, text);
    }
}
