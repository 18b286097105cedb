use chrono::{DateTime, Utc};
use std::fmt;

use exam_core::model::{
    Answer, Attempt, AttemptId, AttemptMode, Essays, Question, QuestionId, Submission,
    SubmissionReceipt, SubmitTrigger,
};
use exam_core::session::{
    AnswerLedger, ExamTimer, FlagSet, NavigationCursor, TickOutcome, TimerUrgency,
};
use storage::repository::EssayDraftRecord;

use super::progress::SessionProgress;
use super::ticker::TickEvent;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Client-side state of one active attempt.
///
/// Built once per attempt by `init`, before any answer or essay is accepted.
/// Resuming (e.g. after a reload) builds a fresh session from the service's
/// snapshot rather than merging into an existing one.
pub struct AttemptSession {
    attempt: Attempt,
    questions: Vec<Question>,
    ledger: AnswerLedger,
    cursor: NavigationCursor,
    flags: FlagSet,
    timer: Option<ExamTimer>,
    essays: Essays,
    dirty: bool,
    receipt: Option<SubmissionReceipt>,
}

impl AttemptSession {
    /// Build a session from the attempt, its questions, and answers recorded earlier.
    ///
    /// Prior answers for questions outside `questions` are dropped. The cursor
    /// lands on the first unanswered question and flags start empty.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn init(
        attempt: Attempt,
        questions: Vec<Question>,
        existing_answers: Vec<Answer>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        let mode = attempt.mode();
        let mut ledger = AnswerLedger::new();
        for answer in existing_answers {
            if questions.iter().any(|q| q.id() == answer.question_id()) {
                ledger.set(answer.for_mode(mode));
            }
        }

        let cursor = NavigationCursor::resume(&questions, &ledger);
        let timer = attempt
            .time_limit_secs()
            .map(|limit| ExamTimer::new(limit, attempt.started_at()));

        Ok(Self {
            attempt,
            questions,
            ledger,
            cursor,
            flags: FlagSet::new(),
            timer,
            essays: Essays::new(),
            dirty: false,
            receipt: None,
        })
    }

    /// Register a callback fired once when the timer reaches zero.
    ///
    /// Has no effect on untimed attempts.
    #[must_use]
    pub fn with_on_expire(mut self, on_expire: impl FnOnce() + Send + 'static) -> Self {
        self.timer = self.timer.map(|timer| timer.with_on_expire(on_expire));
        self
    }

    #[must_use]
    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    #[must_use]
    pub fn attempt_id(&self) -> &AttemptId {
        self.attempt.id()
    }

    #[must_use]
    pub fn mode(&self) -> AttemptMode {
        self.attempt.mode()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor.index()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor.index())
    }

    #[must_use]
    pub fn answer(&self, id: &QuestionId) -> Option<&Answer> {
        self.ledger.get(id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.ledger.len()
    }

    #[must_use]
    pub fn essays(&self) -> &Essays {
        &self.essays
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    #[must_use]
    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.receipt.is_some()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.timer.as_ref().is_some_and(ExamTimer::is_expired)
    }

    /// Fails when the session can no longer take answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AttemptClosed` once the timer has expired and
    /// `SessionError::AlreadySubmitted` after submission.
    ///
    /// Only the last tick is consulted; `AttemptLoopService` ticks the session
    /// against its clock before taking input.
    pub fn ensure_accepting(&self) -> Result<(), SessionError> {
        if self.is_expired() {
            return Err(SessionError::AttemptClosed);
        }
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        Ok(())
    }

    //
    // ─── ANSWERS & ESSAYS ──────────────────────────────────────────────────────
    //

    /// Insert or overwrite the answer for its question.
    ///
    /// Feedback is stripped for exam attempts. Returns the replaced answer, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownQuestion` if the question is not part of the
    /// attempt, or the errors of [`Self::ensure_accepting`].
    pub fn set_answer(&mut self, answer: Answer) -> Result<Option<Answer>, SessionError> {
        self.ensure_accepting()?;
        if self.question(answer.question_id()).is_none() {
            return Err(SessionError::UnknownQuestion(answer.question_id().clone()));
        }
        let previous = self.ledger.set(answer.for_mode(self.attempt.mode()));
        self.dirty = true;
        Ok(previous)
    }

    /// Overwrite the essay text for `task` and mark the session dirty.
    ///
    /// # Errors
    ///
    /// See [`Self::ensure_accepting`].
    pub fn set_essay(
        &mut self,
        task: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_accepting()?;
        self.essays.set(task, text);
        self.dirty = true;
        Ok(())
    }

    /// Merge a cached draft if it belongs to this attempt. Returns whether it was applied.
    pub fn apply_draft(&mut self, draft: &EssayDraftRecord) -> bool {
        if draft.attempt_id != *self.attempt.id() {
            return false;
        }
        self.essays.merge_from(&draft.essays);
        true
    }

    /// Snapshot of the essays suitable for the draft slot.
    #[must_use]
    pub fn draft_record(&self, saved_at: DateTime<Utc>) -> EssayDraftRecord {
        EssayDraftRecord {
            attempt_id: self.attempt.id().clone(),
            essays: self.essays.clone(),
            saved_at,
        }
    }

    //
    // ─── NAVIGATION & FLAGS ────────────────────────────────────────────────────
    //

    /// Out-of-range indices are ignored.
    pub fn go_to_question(&mut self, index: usize) -> bool {
        self.cursor.go_to(index)
    }

    pub fn go_next(&mut self) -> bool {
        self.cursor.next()
    }

    pub fn go_prev(&mut self) -> bool {
        self.cursor.prev()
    }

    /// Toggle the review flag on a question number. Ignored outside exam mode.
    ///
    /// Returns whether the question is flagged afterwards.
    pub fn toggle_flag(&mut self, question_number: u32) -> bool {
        if !self.attempt.mode().allows_flags() {
            return false;
        }
        self.flags.toggle(question_number)
    }

    #[must_use]
    pub fn is_flagged(&self, question_number: u32) -> bool {
        self.flags.is_flagged(question_number)
    }

    #[must_use]
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    //
    // ─── TIMER ─────────────────────────────────────────────────────────────────
    //

    /// `None` for untimed attempts.
    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Option<u32> {
        self.timer.as_ref().map(|timer| timer.remaining_seconds(now))
    }

    #[must_use]
    pub fn urgency(&self, now: DateTime<Utc>) -> Option<TimerUrgency> {
        self.timer.as_ref().map(|timer| timer.urgency(now))
    }

    /// Seconds elapsed since the attempt started.
    #[must_use]
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.attempt.started_at()).num_seconds()).unwrap_or(0)
    }

    /// Feed a tick from a `Ticker`.
    ///
    /// Ticks stamped with another attempt's id come from a timer that should
    /// have been cancelled and are ignored.
    pub fn on_tick(&mut self, event: &TickEvent) -> TickOutcome {
        if event.attempt_id != *self.attempt.id() {
            tracing::debug!(
                attempt_id = %self.attempt.id(),
                stale_attempt_id = %event.attempt_id,
                "ignoring tick from a stale timer"
            );
            return TickOutcome::Stopped;
        }
        self.tick(event.at)
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        match self.timer.as_mut() {
            Some(timer) if self.receipt.is_none() => timer.tick(now),
            _ => TickOutcome::Stopped,
        }
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// Build the final payload. Answers follow question order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` if a receipt was already recorded.
    pub fn build_submission(
        &self,
        trigger: SubmitTrigger,
        now: DateTime<Utc>,
    ) -> Result<Submission, SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        let answers = self
            .questions
            .iter()
            .filter_map(|q| self.ledger.get(q.id()).cloned())
            .collect();
        let elapsed_secs = match self.attempt.time_limit_secs() {
            Some(limit) => self.elapsed_secs(now).min(u64::from(limit)),
            None => self.elapsed_secs(now),
        };
        Ok(Submission {
            answers,
            essays: self.essays.clone(),
            elapsed_secs,
            trigger,
        })
    }

    pub(crate) fn record_receipt(&mut self, receipt: SubmissionReceipt) {
        self.receipt = Some(receipt);
        self.dirty = false;
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self
            .questions
            .iter()
            .filter(|q| self.ledger.contains(q.id()))
            .count();
        SessionProgress {
            total,
            answered,
            flagged: self.flags.len(),
            remaining: total.saturating_sub(answered),
            current_index: self.cursor.index(),
            is_submitted: self.is_submitted(),
        }
    }
}

impl fmt::Debug for AttemptSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptSession")
            .field("attempt_id", self.attempt.id())
            .field("mode", &self.attempt.mode())
            .field("questions_len", &self.questions.len())
            .field("answered", &self.ledger.len())
            .field("current", &self.cursor.index())
            .field("flags", &self.flags.len())
            .field("timer", &self.timer)
            .field("dirty", &self.dirty)
            .field("submitted", &self.receipt.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
