#![forbid(unsafe_code)]

pub mod dictation;
pub mod error;
pub mod sessions;
pub mod vocabulary_service;

pub use exam_core::Clock;
pub use sessions as session;

pub use dictation::{DictationEntry, DictationSession, DictationSummary};
pub use error::{SessionError, VocabularyError};
pub use vocabulary_service::VocabularyService;

pub use sessions::{
    AttemptLoopService, AttemptSession, SessionProgress, TickEvent, TickReport, Ticker,
};
