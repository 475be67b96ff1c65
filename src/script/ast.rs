//! Data model for parsed scripts.
//!
//! Everything here is plain data: steps can be assembled programmatically,
//! serialized, and diffed. The parser guarantees the structural invariants
//! (unique step ids, resolvable jump targets, entry = first declared step);
//! hand-built scripts are on their own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One element of a spoken-line template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionItem {
    /// Placeholder resolved against the environment at speak time.
    Variable(String),
    /// Verbatim text.
    Literal(String),
}

/// Ordered template evaluated when a step speaks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    /// Items concatenated in order during evaluation.
    pub items: Vec<ExpressionItem>,
}

/// Listen window attached to a step.
///
/// Carried verbatim from the script; the interpreter assigns it no timing
/// semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listen {
    /// Window start marker.
    pub begin: i64,
    /// Window end marker.
    pub end: i64,
}

/// A named side-effect call recorded on a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInvocation {
    /// Registered action name.
    pub name: String,
    /// Positional argument tokens, trailing commas stripped.
    pub args: Vec<String>,
}

/// Branch label paired with its jump target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Answer label the intent resolver matches against.
    pub label: String,
    /// Step id to jump to when the label is chosen.
    pub target: String,
}

/// Post-action override predicate.
///
/// When the environment key is truthy after the step's actions ran, the
/// branch carrying `label` wins over whatever jump the listen phase chose.
/// Guards are derived at parse time from the binding table; at most one
/// takes effect per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guard {
    /// Branch label the guard routes to.
    pub label: String,
    /// Environment key whose truthiness is consulted.
    pub key: String,
}

/// One conversational step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique step identifier.
    pub id: String,
    /// Line spoken on entry, if any.
    pub speak: Option<Expression>,
    /// Listen window; presence enables the listen phase.
    pub listen: Option<Listen>,
    /// Branches in first-insertion order.
    pub branches: Vec<Branch>,
    /// Jump target for an empty utterance.
    pub silence: Option<String>,
    /// Jump target when nothing else matched.
    pub default: Option<String>,
    /// Side-effect calls in source order.
    pub actions: Vec<ActionInvocation>,
    /// Override predicates in binding-table order.
    pub guards: Vec<Guard>,
    /// Terminal marker: the conversation ends after this step speaks.
    pub is_exit: bool,
}

impl Step {
    /// Fresh step with the given id and nothing else.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            speak: None,
            listen: None,
            branches: Vec::new(),
            silence: None,
            default: None,
            actions: Vec::new(),
            guards: Vec::new(),
            is_exit: false,
        }
    }

    /// Target of the branch carrying `label`, if declared.
    pub fn branch_target(&self, label: &str) -> Option<&str> {
        self.branches
            .iter()
            .find(|branch| branch.label == label)
            .map(|branch| branch.target.as_str())
    }

    /// True when a branch with this label is declared.
    pub fn has_branch(&self, label: &str) -> bool {
        self.branch_target(label).is_some()
    }

    /// Insert or update a branch, keeping first-insertion order.
    pub fn bind_branch(&mut self, label: impl Into<String>, target: impl Into<String>) {
        let label = label.into();
        let target = target.into();
        match self.branches.iter_mut().find(|branch| branch.label == label) {
            Some(branch) => branch.target = target,
            None => self.branches.push(Branch { label, target }),
        }
    }
}

/// A parsed script: the unit the interpreter runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Steps in declaration order, ids unique.
    pub steps: Vec<Step>,
    /// Entry step id: the first declared step, `None` for an empty script.
    pub entry: Option<String>,
    /// Every `$name` referenced by a `Speak` line, in first-reference order.
    pub vars: Vec<String>,
}

impl Script {
    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Number of declared steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the script declares no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for ExpressionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionItem::Variable(name) => write!(f, "${name}"),
            ExpressionItem::Literal(text) => write!(f, "{text:?}"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, item) in self.items.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "step {}", self.id)?;
        if let Some(speak) = &self.speak {
            writeln!(f, "  speak {speak}")?;
        }
        if let Some(listen) = &self.listen {
            writeln!(f, "  listen {} {}", listen.begin, listen.end)?;
        }
        for branch in &self.branches {
            writeln!(f, "  branch {:?} -> {}", branch.label, branch.target)?;
        }
        for guard in &self.guards {
            writeln!(f, "  guard {:?} when {}", guard.label, guard.key)?;
        }
        if let Some(target) = &self.silence {
            writeln!(f, "  silence -> {target}")?;
        }
        if let Some(target) = &self.default {
            writeln!(f, "  default -> {target}")?;
        }
        for action in &self.actions {
            write!(f, "  action {}", action.name)?;
            for arg in &action.args {
                write!(f, " {arg}")?;
            }
            writeln!(f)?;
        }
        if self.is_exit {
            writeln!(f, "  exit")?;
        }
        Ok(())
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.entry.as_deref().unwrap_or("-");
        writeln!(f, "script: {} steps, entry {entry}", self.len())?;
        if !self.vars.is_empty() {
            writeln!(f, "vars: {}", self.vars.join(", "))?;
        }
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
