use crate::model::Question;
use crate::session::ledger::AnswerLedger;

/// Position within the ordered question list of a session.
///
/// Out-of-range moves are ignored rather than rejected, so stale UI events
/// cannot push the cursor outside `[0, total)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationCursor {
    index: usize,
    total: usize,
}

impl NavigationCursor {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self { index: 0, total }
    }

    /// Cursor positioned on the first question without an answer, or 0 when
    /// nothing or everything is answered.
    #[must_use]
    pub fn resume(questions: &[Question], ledger: &AnswerLedger) -> Self {
        let index = questions
            .iter()
            .position(|q| !ledger.contains(q.id()))
            .unwrap_or(0);
        Self {
            index,
            total: questions.len(),
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Jump to `index`. Returns `false` and leaves the cursor unchanged when out of range.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index < self.total {
            self.index = index;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.index.saturating_add(1))
    }

    pub fn prev(&mut self) -> bool {
        match self.index.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, AnswerResponse, QuestionId, QuestionType};

    fn questions(n: u32) -> Vec<Question> {
        (1..=n)
            .map(|i| {
                Question::new(QuestionId::new(format!("q{i}")), i, QuestionType::Reading, "Q")
                    .unwrap()
            })
            .collect()
    }

    fn answered(ids: &[&str]) -> AnswerLedger {
        let mut ledger = AnswerLedger::new();
        for id in ids {
            ledger.set(Answer::new(QuestionId::new(*id), 1, AnswerResponse::Choice("a".into())));
        }
        ledger
    }

    #[test]
    fn out_of_range_go_to_is_ignored() {
        let mut cursor = NavigationCursor::new(3);
        cursor.go_to(2);
        assert!(!cursor.go_to(3));
        assert!(!cursor.go_to(usize::MAX));
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn next_and_prev_clamp_at_bounds() {
        let mut cursor = NavigationCursor::new(3);
        assert!(!cursor.prev());
        assert_eq!(cursor.index(), 0);

        cursor.go_to(2);
        assert!(!cursor.next());
        assert_eq!(cursor.index(), 2);
        assert!(cursor.is_last());

        assert!(cursor.prev());
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn empty_cursor_never_moves() {
        let mut cursor = NavigationCursor::new(0);
        assert!(!cursor.next());
        assert!(!cursor.go_to(0));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn resume_picks_first_unanswered() {
        let qs = questions(3);
        assert_eq!(NavigationCursor::resume(&qs, &answered(&["q2"])).index(), 0);
        assert_eq!(NavigationCursor::resume(&qs, &answered(&["q1", "q2"])).index(), 2);
    }

    #[test]
    fn resume_falls_back_to_start() {
        let qs = questions(3);
        assert_eq!(NavigationCursor::resume(&qs, &AnswerLedger::new()).index(), 0);
        assert_eq!(
            NavigationCursor::resume(&qs, &answered(&["q1", "q2", "q3"])).index(),
            0
        );
    }
}
