use exam_core::dictation::{self, DictationError, DictationVerdict};

/// Outcome of one dictated word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictationEntry {
    pub reference: String,
    pub attempt: String,
    pub verdict: DictationVerdict,
}

/// Totals for a finished (or partially finished) dictation.
#[derive(Debug, Clone, PartialEq)]
pub struct DictationSummary {
    pub total: usize,
    pub attempted: usize,
    pub exact: usize,
    pub partial: usize,
    pub incorrect: usize,
    /// Mean credit over attempted words, in `[0, 1]`.
    pub score: f32,
}

/// Steps through a list of reference words, one attempt each.
#[derive(Debug, Clone)]
pub struct DictationSession {
    references: Vec<String>,
    entries: Vec<DictationEntry>,
}

impl DictationSession {
    /// # Errors
    ///
    /// Returns `DictationError::NoReferences` for an empty list and
    /// `DictationError::EmptyReference` for a reference with no letters.
    pub fn new(references: Vec<String>) -> Result<Self, DictationError> {
        if references.is_empty() {
            return Err(DictationError::NoReferences);
        }
        if let Some(pos) = references
            .iter()
            .position(|r| dictation::normalize(r).is_empty())
        {
            return Err(DictationError::EmptyReference(pos));
        }
        Ok(Self {
            references,
            entries: Vec::new(),
        })
    }

    /// Reference to be played next, if any.
    #[must_use]
    pub fn current_reference(&self) -> Option<&str> {
        self.references.get(self.entries.len()).map(String::as_str)
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.references.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entries.len() >= self.references.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[DictationEntry] {
        &self.entries
    }

    /// Grade `attempt` against the current reference and advance.
    ///
    /// # Errors
    ///
    /// Returns `DictationError::Completed` once every reference has been attempted.
    pub fn submit(&mut self, attempt: &str) -> Result<DictationVerdict, DictationError> {
        let reference = self
            .current_reference()
            .ok_or(DictationError::Completed)?
            .to_owned();
        let verdict = dictation::compare(&reference, attempt);
        tracing::debug!(position = self.entries.len(), verdict = ?verdict, "dictation word graded");
        self.entries.push(DictationEntry {
            reference,
            attempt: attempt.to_owned(),
            verdict,
        });
        Ok(verdict)
    }

    #[must_use]
    pub fn summary(&self) -> DictationSummary {
        let verdicts: Vec<_> = self.entries.iter().map(|e| e.verdict).collect();
        let exact = verdicts
            .iter()
            .filter(|v| matches!(v, DictationVerdict::Exact))
            .count();
        let incorrect = verdicts
            .iter()
            .filter(|v| matches!(v, DictationVerdict::Incorrect))
            .count();
        DictationSummary {
            total: self.references.len(),
            attempted: verdicts.len(),
            exact,
            partial: verdicts.len() - exact - incorrect,
            incorrect,
            score: dictation::score(&verdicts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn rejects_empty_inputs() {
        assert_eq!(
            DictationSession::new(Vec::new()).unwrap_err(),
            DictationError::NoReferences
        );
        assert_eq!(
            DictationSession::new(words(&["chat", " ?! "])).unwrap_err(),
            DictationError::EmptyReference(1)
        );
    }

    #[test]
    fn walks_references_and_summarizes() {
        let mut session = DictationSession::new(words(&["château", "maison", "chien"])).unwrap();

        assert_eq!(session.current_reference(), Some("château"));
        assert_eq!(session.submit("chateau").unwrap(), DictationVerdict::AccentMismatch);
        assert_eq!(session.submit("Maison.").unwrap(), DictationVerdict::Exact);
        assert_eq!(session.submit("chat").unwrap(), DictationVerdict::Incorrect);
        assert!(session.is_complete());
        assert_eq!(session.submit("encore").unwrap_err(), DictationError::Completed);

        let summary = session.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.exact, 1);
        assert_eq!(summary.partial, 1);
        assert_eq!(summary.incorrect, 1);
        assert!((summary.score - 0.5).abs() < f32::EPSILON);
    }
}
