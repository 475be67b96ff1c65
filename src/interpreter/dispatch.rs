//! Action dispatch: the registry and its error surface.

use super::value::Environment;
use crate::script::ActionInvocation;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Convenience result alias for action dispatch.
pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// Failures surfaced by action dispatch.
///
/// Neither variant interrupts a running step; the session logs the failure
/// and moves on to the next invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// No action is registered under the invoked name.
    #[error("unknown action '{name}'")]
    Unknown {
        /// Name the script asked for.
        name: String,
    },

    /// The action ran and reported a failure.
    #[error("action '{name}' failed: {reason}")]
    Failed {
        /// Registered action name.
        name: String,
        /// Failure description supplied by the action.
        reason: String,
    },
}

impl ActionError {
    /// Failure constructor for action implementations.
    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ActionError::Failed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Executes the side-effect calls a step declares.
pub trait ActionDispatcher {
    /// Run one invocation against the environment.
    ///
    /// `utterance` is the display form of the most recent non-empty user
    /// input, snapshotted once before the step's action list runs.
    fn invoke(
        &mut self,
        call: &ActionInvocation,
        env: &mut Environment,
        utterance: &str,
    ) -> ActionResult<()>;
}

/// Boxed action callable stored in a registry.
pub type ActionFn = Box<dyn FnMut(&mut Environment, &str, &[String]) -> ActionResult<()> + Send>;

/// Name-keyed table of registered actions.
///
/// Hosts assemble a registry once at startup and hand it to each session;
/// nothing is registered globally. Unknown names surface as
/// [`ActionError::Unknown`].
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, ActionFn>,
}

impl ActionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, action: F)
    where
        F: FnMut(&mut Environment, &str, &[String]) -> ActionResult<()> + Send + 'static,
    {
        self.actions.insert(name.into(), Box::new(action));
    }

    /// True when an action is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ActionDispatcher for ActionRegistry {
    fn invoke(
        &mut self,
        call: &ActionInvocation,
        env: &mut Environment,
        utterance: &str,
    ) -> ActionResult<()> {
        let Some(action) = self.actions.get_mut(&call.name) else {
            return Err(ActionError::Unknown {
                name: call.name.clone(),
            });
        };
        debug!(action = %call.name, args = ?call.args, "dispatching action");
        action(env, utterance, &call.args)
    }
}
