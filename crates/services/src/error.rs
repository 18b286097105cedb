//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{AttemptError, QuestionId};
use exam_core::vocabulary::BookmarkChange;
use storage::repository::StorageError;

/// Errors emitted by attempt sessions.
///
/// Out-of-range navigation, stale drafts and failed draft writes are not
/// errors; they are ignored or logged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("attempt has no questions")]
    Empty,
    #[error("question {0} is not part of this attempt")]
    UnknownQuestion(QuestionId),
    #[error("attempt already submitted")]
    AlreadySubmitted,
    #[error("attempt is closed for new answers")]
    AttemptClosed,
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `VocabularyService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VocabularyError {
    #[error("bookmark change {change:?} failed and was rolled back")]
    RolledBack {
        change: BookmarkChange,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}
