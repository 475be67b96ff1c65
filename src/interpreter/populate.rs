//! Utterance capture into script variables.

use super::value::Environment;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// First numeric substring: digits with at most one `.` or `,` group.
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("number pattern"));

/// Ordered capture pass over the declared variables.
///
/// The first rule that fires ends the pass, and no rule overwrites a
/// variable that is already bound. Variables are scanned in declaration
/// order; name checks are case-insensitive.
///
/// 1. A variable whose name mentions an amount (`amount`, `money`, `金额`)
///    takes the first numeric substring of the utterance, commas stripped.
/// 2. A variable whose name mentions a person's name (`name`, `姓名`) and
///    does not end in `_id` takes the trimmed utterance.
/// 3. Otherwise, when the script declares any variables, the trimmed
///    utterance is stored under [`Environment::LAST_INPUT`].
pub fn populate(env: &mut Environment, vars: &[String], utterance: &str) {
    if utterance.is_empty() {
        return;
    }

    for var in vars {
        let name = var.to_lowercase();
        if (name.contains("amount") || name.contains("money") || name.contains("金额"))
            && !env.contains(var)
        {
            if let Some(found) = NUMBER.find(utterance) {
                let digits = found.as_str().replace(',', "");
                debug!(var = %var, value = %digits, "captured amount");
                env.set(var.clone(), digits);
                return;
            }
        }
    }

    for var in vars {
        let name = var.to_lowercase();
        if (name.contains("name") || name.contains("姓名"))
            && !name.ends_with("_id")
            && !env.contains(var)
        {
            debug!(var = %var, "captured name");
            env.set(var.clone(), utterance.trim());
            return;
        }
    }

    if !vars.is_empty() {
        env.set(Environment::LAST_INPUT, utterance.trim());
    }
}
