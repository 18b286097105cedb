use chrono::Duration;
use std::sync::Arc;

use exam_core::model::{
    Answer, AnswerResponse, AttemptId, QuestionId, SubmissionReceipt, SubmitTrigger,
};
use exam_core::session::TickOutcome;
use storage::repository::{AttemptRepository, DraftStore, StorageError};

use super::service::AttemptSession;
use super::ticker::TickEvent;
use crate::Clock;
use crate::error::SessionError;

/// Drafts older than this many seconds are treated as abandoned.
pub const DEFAULT_DRAFT_MAX_AGE_SECS: i64 = 86_400;

/// What happened when a tick was fed into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Set when this tick expired the timer and the forced submission went through.
    pub receipt: Option<SubmissionReceipt>,
}

/// Orchestrates attempt sessions against the Attempt service and the draft slot.
///
/// Draft persistence is best-effort: failures are logged and never reach the caller.
#[derive(Clone)]
pub struct AttemptLoopService {
    clock: Clock,
    attempts: Arc<dyn AttemptRepository>,
    drafts: Arc<dyn DraftStore>,
    draft_max_age: Duration,
}

impl AttemptLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        attempts: Arc<dyn AttemptRepository>,
        drafts: Arc<dyn DraftStore>,
    ) -> Self {
        Self {
            clock,
            attempts,
            drafts,
            draft_max_age: Duration::seconds(DEFAULT_DRAFT_MAX_AGE_SECS),
        }
    }

    #[must_use]
    pub fn with_draft_max_age(mut self, max_age: Duration) -> Self {
        self.draft_max_age = max_age;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Open or resume an attempt.
    ///
    /// Prior answers come from the Attempt service; essay drafts come from the
    /// draft slot, but only when they were saved for this same attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AttemptClosed` if the attempt is no longer in
    /// progress, `SessionError::Empty` if it has no questions, and
    /// `SessionError::Storage` if the Attempt service fails.
    pub async fn start_attempt(&self, attempt_id: &AttemptId) -> Result<AttemptSession, SessionError> {
        let snapshot = self.attempts.load_attempt(attempt_id).await?;
        if !snapshot.attempt.status().is_open() {
            return Err(SessionError::AttemptClosed);
        }

        let mut session =
            AttemptSession::init(snapshot.attempt, snapshot.questions, snapshot.answers)?;
        self.restore_draft(&mut session).await;

        tracing::info!(
            attempt_id = %attempt_id,
            mode = %session.mode(),
            answered = session.answered_count(),
            resume_index = session.current_index(),
            "attempt session started"
        );
        Ok(session)
    }

    async fn restore_draft(&self, session: &mut AttemptSession) {
        let draft = match self.drafts.load_draft().await {
            Ok(Some(draft)) => draft,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(attempt_id = %session.attempt_id(), error = %err, "could not read essay draft");
                return;
            }
        };

        if self.clock.now() - draft.saved_at > self.draft_max_age {
            tracing::debug!(attempt_id = %session.attempt_id(), "ignoring expired essay draft");
            return;
        }
        if session.apply_draft(&draft) {
            tracing::debug!(
                attempt_id = %session.attempt_id(),
                tasks = draft.essays.len(),
                "restored essay draft"
            );
        } else {
            tracing::debug!(
                attempt_id = %session.attempt_id(),
                draft_attempt_id = %draft.attempt_id,
                "ignoring essay draft from another attempt"
            );
        }
    }

    /// Record an answer with the Attempt service, then in the session.
    ///
    /// Practice attempts get correctness back immediately and keep it on the answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownQuestion` for questions outside the attempt,
    /// `SessionError::AlreadySubmitted` / `SessionError::AttemptClosed` for
    /// closed sessions (including one whose time ran out since the last tick),
    /// and `SessionError::Storage` for service failures.
    pub async fn answer(
        &self,
        session: &mut AttemptSession,
        question_id: &QuestionId,
        response: AnswerResponse,
    ) -> Result<Answer, SessionError> {
        self.sync_timer(session).await?;
        session.ensure_accepting()?;
        let number = session
            .question(question_id)
            .map(|q| q.number())
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.clone()))?;

        let mut answer = Answer::new(question_id.clone(), number, response);
        if let Some(feedback) = self
            .attempts
            .record_answer(session.attempt_id(), &answer)
            .await?
        {
            answer = answer.with_feedback(feedback);
        }

        session.set_answer(answer.clone())?;
        Ok(answer.for_mode(session.mode()))
    }

    /// Overwrite an essay and re-persist the whole essays map to the draft slot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` / `SessionError::AttemptClosed`
    /// for closed sessions. Draft write failures are swallowed.
    pub async fn set_essay(
        &self,
        session: &mut AttemptSession,
        task: &str,
        text: &str,
    ) -> Result<(), SessionError> {
        self.sync_timer(session).await?;
        session.set_essay(task, text)?;
        self.persist_draft(session).await;
        Ok(())
    }

    async fn persist_draft(&self, session: &AttemptSession) {
        let record = session.draft_record(self.clock.now());
        if let Err(err) = self.drafts.save_draft(&record).await {
            tracing::warn!(
                attempt_id = %session.attempt_id(),
                error = %err,
                "could not persist essay draft; continuing without recovery"
            );
        }
    }

    async fn clear_draft(&self, attempt_id: &AttemptId) {
        if let Err(err) = self.drafts.clear_draft().await {
            tracing::warn!(attempt_id = %attempt_id, error = %err, "could not clear essay draft");
        }
    }

    /// Feed a tick into the session; a tick that expires the timer forces a submission.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::submit`] for the forced submission.
    pub async fn on_tick(
        &self,
        session: &mut AttemptSession,
        event: &TickEvent,
    ) -> Result<TickReport, SessionError> {
        let outcome = session.on_tick(event);
        if outcome != TickOutcome::Expired {
            return Ok(TickReport {
                outcome,
                receipt: None,
            });
        }

        let receipt = self.submit_expired(session).await?;
        Ok(TickReport { outcome, receipt })
    }

    /// Check the timer against the clock before accepting input.
    ///
    /// A session resumed past its limit expires here rather than on the next
    /// tick, and its forced submission goes out immediately.
    async fn sync_timer(&self, session: &mut AttemptSession) -> Result<(), SessionError> {
        if session.tick(self.clock.now()) == TickOutcome::Expired {
            self.submit_expired(session).await?;
        }
        Ok(())
    }

    async fn submit_expired(
        &self,
        session: &mut AttemptSession,
    ) -> Result<Option<SubmissionReceipt>, SessionError> {
        tracing::info!(attempt_id = %session.attempt_id(), "time limit reached, submitting");
        match self.submit(session, SubmitTrigger::Expired).await {
            Ok(receipt) => Ok(Some(receipt)),
            Err(SessionError::AlreadySubmitted) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Submit the attempt. The first accepted submission wins.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` if this session (or another
    /// client) already submitted, and `SessionError::Storage` for other
    /// service failures.
    pub async fn submit(
        &self,
        session: &mut AttemptSession,
        trigger: SubmitTrigger,
    ) -> Result<SubmissionReceipt, SessionError> {
        let now = self.clock.now();
        let submission = session.build_submission(trigger, now)?;

        let receipt = match self
            .attempts
            .submit_attempt(session.attempt_id(), &submission, now)
            .await
        {
            Ok(receipt) => receipt,
            Err(StorageError::Conflict) => return Err(SessionError::AlreadySubmitted),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            attempt_id = %session.attempt_id(),
            trigger = ?trigger,
            correct = receipt.correct,
            graded = receipt.graded,
            elapsed_secs = submission.elapsed_secs,
            "attempt submitted"
        );
        session.record_receipt(receipt.clone());
        self.clear_draft(session.attempt_id()).await;
        Ok(receipt)
    }

    /// Tear down a session and remove its cached essays.
    pub async fn reset(&self, session: AttemptSession) {
        self.clear_draft(session.attempt_id()).await;
        tracing::debug!(attempt_id = %session.attempt_id(), "attempt session reset");
    }
}
