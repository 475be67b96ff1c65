//! Spoken-line template evaluation.

use super::value::Environment;
use crate::script::{Expression, ExpressionItem};

/// Render an expression against the environment.
///
/// Items concatenate in order; unset variables render as the empty string.
/// The two-character sequence `\n` becomes a real newline in the final
/// text. The replacement runs after concatenation, so the pair may straddle
/// item boundaries.
pub fn evaluate(expression: &Expression, env: &Environment) -> String {
    let mut text = String::new();
    for item in &expression.items {
        match item {
            ExpressionItem::Variable(name) => text.push_str(&env.render(name)),
            ExpressionItem::Literal(literal) => text.push_str(literal),
        }
    }
    text.replace("\\n", "\n")
}
