//! Keyword-based intent resolution.

use crate::interpreter::IntentResolver;
use std::collections::HashMap;
use tracing::debug;

/// Matches utterances to branch labels by case-insensitive containment.
///
/// Labels are tried in the order the session presents them, which is the
/// order their branches appear in the step. A label matches when the
/// utterance contains the label text itself or any registered alias, so
/// `Branch "cancel order" refund` fires on "please cancel order A001" as
/// well as on an aliased phrasing like "i want a refund".
#[derive(Debug, Default, Clone)]
pub struct KeywordResolver {
    aliases: HashMap<String, Vec<String>>,
}

impl KeywordResolver {
    /// Resolver with no aliases; labels match only on their own text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register extra phrases that count as a match for `label`.
    pub fn with_alias(
        mut self,
        label: impl Into<String>,
        phrases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let entry = self.aliases.entry(label.into()).or_default();
        for phrase in phrases {
            let phrase: String = phrase.into();
            entry.push(phrase.to_lowercase());
        }
        self
    }

    fn matches(&self, utterance: &str, label: &str) -> bool {
        if utterance.contains(&label.to_lowercase()) {
            return true;
        }
        self.aliases
            .get(label)
            .is_some_and(|phrases| phrases.iter().any(|phrase| utterance.contains(phrase.as_str())))
    }
}

impl IntentResolver for KeywordResolver {
    fn resolve(&self, utterance: &str, labels: &[&str]) -> Option<String> {
        let lowered = utterance.to_lowercase();
        let hit = labels
            .iter()
            .find(|label| self.matches(&lowered, label))
            .map(|label| label.to_string());
        debug!(?hit, "keyword intent");
        hit
    }
}
