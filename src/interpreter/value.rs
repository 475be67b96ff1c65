//! Environment values and the per-run variable store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One environment cell: a script variable or an action result.
///
/// Coercions are total. Anything can be rendered as text, asked for a
/// numeric view, or tested for truthiness without panicking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// UTF-8 text.
    Text(String),
    /// Floating-point number; integral values render without a fraction.
    Number(f64),
    /// Boolean flag.
    Boolean(bool),
}

impl Value {
    /// Numeric view: numbers as-is, parseable text, booleans as 0/1.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Text(text) => text.trim().parse().ok(),
            Value::Boolean(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        }
    }

    /// Truthiness: empty text, zero, and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(text) => !text.is_empty(),
            Value::Number(number) => *number != 0.0,
            Value::Boolean(flag) => *flag,
        }
    }

    /// Borrow the text content when the value is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Number(number) => write!(f, "{number}"),
            Value::Boolean(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Number(number)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Boolean(flag)
    }
}

/// Mutable per-run variable store shared by every phase of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    values: HashMap<String, Value>,
}

impl Environment {
    /// Reserved key holding the most recent non-empty utterance.
    pub const LAST_INPUT: &'static str = "_last_input";

    /// Empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// True when `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Display form of a variable; unset variables render empty.
    pub fn render(&self, name: &str) -> String {
        self.get(name).map(Value::to_string).unwrap_or_default()
    }

    /// Truthiness of a variable; unset variables are falsy.
    pub fn truthy(&self, name: &str) -> bool {
        self.get(name).is_some_and(Value::is_truthy)
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_integral_numbers_without_fraction() {
        assert_eq!(Value::Number(30.0).to_string(), "30");
        assert_eq!(Value::Number(30.5).to_string(), "30.5");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Text("hi".into()).to_string(), "hi");
    }

    #[test]
    fn truthiness_follows_emptiness_and_zero() {
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::Text("0".into()).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Number(-1.5).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
    }

    #[test]
    fn numeric_view_parses_text() {
        assert_eq!(Value::Text(" 42 ".into()).as_number(), Some(42.0));
        assert_eq!(Value::Text("forty".into()).as_number(), None);
        assert_eq!(Value::Boolean(true).as_number(), Some(1.0));
    }

    #[test]
    fn unset_variables_render_empty_and_falsy() {
        let env = Environment::new();
        assert_eq!(env.render("missing"), "");
        assert!(!env.truthy("missing"));
    }

    #[test]
    fn set_replaces_previous_binding() {
        let mut env = Environment::new();
        env.set("x", "text");
        env.set("x", 7.0);
        assert_eq!(env.get("x"), Some(&Value::Number(7.0)));
        assert_eq!(env.len(), 1);
    }
}
