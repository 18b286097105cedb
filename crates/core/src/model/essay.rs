use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-text essays of a writing attempt, keyed by task number ("1", "2", "3").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Essays(BTreeMap<String, String>);

impl Essays {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the text for a task.
    pub fn set(&mut self, task: impl Into<String>, text: impl Into<String>) {
        self.0.insert(task.into(), text.into());
    }

    #[must_use]
    pub fn get(&self, task: &str) -> Option<&str> {
        self.0.get(task).map(String::as_str)
    }

    /// Whitespace-delimited word count; zero for a missing task.
    #[must_use]
    pub fn word_count(&self, task: &str) -> usize {
        self.get(task).map_or(0, |text| text.split_whitespace().count())
    }

    #[must_use]
    pub fn total_words(&self) -> usize {
        self.0.values().map(|text| text.split_whitespace().count()).sum()
    }

    /// Copy every task of `other` over this map.
    pub fn merge_from(&mut self, other: &Essays) {
        for (task, text) in &other.0 {
            self.0.insert(task.clone(), text.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
