use std::collections::HashMap;

use crate::model::{Answer, QuestionId};

/// Latest answer per question id.
///
/// Iteration order is unspecified; callers derive display order from the question list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    entries: HashMap<QuestionId, Answer>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the answer for its question. Returns the replaced answer, if any.
    pub fn set(&mut self, answer: Answer) -> Option<Answer> {
        self.entries.insert(answer.question_id().clone(), answer)
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<&Answer> {
        self.entries.get(question_id)
    }

    #[must_use]
    pub fn contains(&self, question_id: &QuestionId) -> bool {
        self.entries.contains_key(question_id)
    }

    /// Number of distinct questions answered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn answers(&self) -> impl Iterator<Item = &Answer> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerResponse;

    fn choice(id: &str, key: &str) -> Answer {
        Answer::new(QuestionId::new(id), 1, AnswerResponse::Choice(key.into()))
    }

    #[test]
    fn last_write_wins_and_size_counts_distinct_ids() {
        let mut ledger = AnswerLedger::new();
        let writes = [("q1", "a"), ("q2", "b"), ("q1", "c"), ("q3", "d"), ("q2", "a")];
        for (id, key) in writes {
            ledger.set(choice(id, key));
        }

        assert_eq!(ledger.len(), 3);
        let q1 = ledger.get(&QuestionId::new("q1")).unwrap();
        assert_eq!(q1.response().as_str(), "c");
        let q2 = ledger.get(&QuestionId::new("q2")).unwrap();
        assert_eq!(q2.response().as_str(), "a");
    }

    #[test]
    fn set_returns_replaced_answer() {
        let mut ledger = AnswerLedger::new();
        assert!(ledger.set(choice("q1", "a")).is_none());
        let previous = ledger.set(choice("q1", "b")).unwrap();
        assert_eq!(previous.response().as_str(), "a");
    }

    #[test]
    fn missing_id_is_absent() {
        let ledger = AnswerLedger::new();
        assert!(ledger.get(&QuestionId::new("nope")).is_none());
        assert!(ledger.is_empty());
    }
}
