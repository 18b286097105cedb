use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{
    Answer, AnswerFeedback, AnswerResponse, Attempt, AttemptId, AttemptStatus, Essays, Question,
    QuestionId, Submission, SubmissionReceipt, WordId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Everything the Attempt service returns when a session is opened or resumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSnapshot {
    pub attempt: Attempt,
    pub questions: Vec<Question>,
    /// Answers already recorded for this attempt, empty for a fresh start.
    pub answers: Vec<Answer>,
}

/// The single shared essay draft slot.
///
/// Only one writing attempt is expected in flight at a time, so there is one
/// slot rather than one per attempt. Readers must check `attempt_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayDraftRecord {
    pub attempt_id: AttemptId,
    pub essays: Essays,
    pub saved_at: DateTime<Utc>,
}

/// Contract of the remote Attempt service.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Fetch the attempt with its questions and any previously recorded answers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the attempt does not exist.
    async fn load_attempt(&self, id: &AttemptId) -> Result<AttemptSnapshot, StorageError>;

    /// Record one answer. Practice attempts get correctness back immediately.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown attempts or questions and
    /// `StorageError::Conflict` if the attempt is no longer in progress.
    async fn record_answer(
        &self,
        id: &AttemptId,
        answer: &Answer,
    ) -> Result<Option<AnswerFeedback>, StorageError>;

    /// Submit the attempt for grading. Only the first submission is accepted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt was already submitted.
    async fn submit_attempt(
        &self,
        id: &AttemptId,
        submission: &Submission,
        submitted_at: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, StorageError>;
}

/// Short-lived key-value slot for essay drafts.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read or decoded.
    async fn load_draft(&self) -> Result<Option<EssayDraftRecord>, StorageError>;

    /// Replace the slot contents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails (e.g. quota exhausted).
    async fn save_draft(&self, draft: &EssayDraftRecord) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be cleared.
    async fn clear_draft(&self) -> Result<(), StorageError>;
}

/// Contract of the remote vocabulary bookmark list.
#[async_trait]
pub trait VocabularyRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be fetched.
    async fn list_bookmarks(&self) -> Result<Vec<WordId>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark cannot be stored.
    async fn add_bookmark(&self, word: WordId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark cannot be removed.
    async fn remove_bookmark(&self, word: WordId) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct AttemptEntry {
    attempt: Attempt,
    questions: Vec<Question>,
    answer_key: HashMap<QuestionId, String>,
    answers: HashMap<QuestionId, Answer>,
    receipt: Option<SubmissionReceipt>,
}

impl AttemptEntry {
    fn feedback_for(&self, answer: &Answer) -> Option<AnswerFeedback> {
        let correct_key = self.answer_key.get(answer.question_id())?;
        Some(AnswerFeedback {
            is_correct: matches!(answer.response(), AnswerResponse::Choice(key) if key == correct_key),
            correct_key: correct_key.clone(),
        })
    }
}

/// In-memory implementation of every repository, for tests and the demo binary.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    attempts: Arc<Mutex<HashMap<AttemptId, AttemptEntry>>>,
    draft: Arc<Mutex<Option<EssayDraftRecord>>>,
    bookmarks: Arc<Mutex<BTreeSet<WordId>>>,
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Connection(err.to_string())
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attempt with its questions and the correct option key per question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt id is already registered.
    pub fn seed_attempt(
        &self,
        attempt: Attempt,
        questions: Vec<Question>,
        answer_key: HashMap<QuestionId, String>,
    ) -> Result<(), StorageError> {
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        if guard.contains_key(attempt.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(
            attempt.id().clone(),
            AttemptEntry {
                attempt,
                questions,
                answer_key,
                answers: HashMap::new(),
                receipt: None,
            },
        );
        Ok(())
    }

    /// Current status of an attempt as seen by the service.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown attempts.
    pub fn attempt_status(&self, id: &AttemptId) -> Result<AttemptStatus, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        guard
            .get(id)
            .map(|entry| entry.attempt.status())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn load_attempt(&self, id: &AttemptId) -> Result<AttemptSnapshot, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        let entry = guard.get(id).ok_or(StorageError::NotFound)?;
        let mode = entry.attempt.mode();
        let answers = entry
            .questions
            .iter()
            .filter_map(|q| entry.answers.get(q.id()))
            .map(|answer| answer.clone().for_mode(mode))
            .collect();
        Ok(AttemptSnapshot {
            attempt: entry.attempt.clone(),
            questions: entry.questions.clone(),
            answers,
        })
    }

    async fn record_answer(
        &self,
        id: &AttemptId,
        answer: &Answer,
    ) -> Result<Option<AnswerFeedback>, StorageError> {
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        let entry = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        if !entry.attempt.status().is_open() {
            return Err(StorageError::Conflict);
        }
        if !entry.questions.iter().any(|q| q.id() == answer.question_id()) {
            return Err(StorageError::NotFound);
        }

        let feedback = entry.feedback_for(answer);
        let stored = match &feedback {
            Some(feedback) => answer.clone().with_feedback(feedback.clone()),
            None => answer.clone(),
        };
        entry.answers.insert(answer.question_id().clone(), stored);

        Ok(feedback.filter(|_| entry.attempt.mode().reveals_feedback()))
    }

    async fn submit_attempt(
        &self,
        id: &AttemptId,
        submission: &Submission,
        submitted_at: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, StorageError> {
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        let entry = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        if entry.receipt.is_some() || !entry.attempt.status().is_open() {
            return Err(StorageError::Conflict);
        }

        for answer in &submission.answers {
            if entry.questions.iter().any(|q| q.id() == answer.question_id()) {
                entry
                    .answers
                    .insert(answer.question_id().clone(), answer.clone());
            }
        }

        let correct = entry
            .answers
            .values()
            .filter_map(|answer| entry.feedback_for(answer))
            .filter(|feedback| feedback.is_correct)
            .count();
        let receipt = SubmissionReceipt {
            attempt_id: id.clone(),
            status: AttemptStatus::Completed,
            correct: u32::try_from(correct).unwrap_or(u32::MAX),
            graded: u32::try_from(entry.answer_key.len()).unwrap_or(u32::MAX),
            submitted_at,
        };

        entry.attempt = entry.attempt.clone().with_status(AttemptStatus::Completed);
        entry.receipt = Some(receipt.clone());
        Ok(receipt)
    }
}

#[async_trait]
impl DraftStore for InMemoryRepository {
    async fn load_draft(&self) -> Result<Option<EssayDraftRecord>, StorageError> {
        let guard = self.draft.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn save_draft(&self, draft: &EssayDraftRecord) -> Result<(), StorageError> {
        let mut guard = self.draft.lock().map_err(poisoned)?;
        *guard = Some(draft.clone());
        Ok(())
    }

    async fn clear_draft(&self) -> Result<(), StorageError> {
        let mut guard = self.draft.lock().map_err(poisoned)?;
        *guard = None;
        Ok(())
    }
}

#[async_trait]
impl VocabularyRepository for InMemoryRepository {
    async fn list_bookmarks(&self) -> Result<Vec<WordId>, StorageError> {
        let guard = self.bookmarks.lock().map_err(poisoned)?;
        Ok(guard.iter().copied().collect())
    }

    async fn add_bookmark(&self, word: WordId) -> Result<(), StorageError> {
        let mut guard = self.bookmarks.lock().map_err(poisoned)?;
        guard.insert(word);
        Ok(())
    }

    async fn remove_bookmark(&self, word: WordId) -> Result<(), StorageError> {
        let mut guard = self.bookmarks.lock().map_err(poisoned)?;
        guard.remove(&word);
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub attempts: Arc<dyn AttemptRepository>,
    pub drafts: Arc<dyn DraftStore>,
    pub vocabulary: Arc<dyn VocabularyRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(&InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository so callers can keep seeding it.
    #[must_use]
    pub fn from_in_memory(repo: &InMemoryRepository) -> Self {
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo.clone());
        let drafts: Arc<dyn DraftStore> = Arc::new(repo.clone());
        let vocabulary: Arc<dyn VocabularyRepository> = Arc::new(repo.clone());
        Self {
            attempts,
            drafts,
            vocabulary,
        }
    }

    #[must_use]
    pub fn with_drafts(mut self, drafts: Arc<dyn DraftStore>) -> Self {
        self.drafts = drafts;
        self
    }
}
