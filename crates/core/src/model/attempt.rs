use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::AttemptId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt must contain at least one question")]
    NoQuestions,

    #[error("time limit must be > 0 seconds")]
    InvalidTimeLimit,

    #[error("unknown attempt mode: {0}")]
    UnknownMode(String),

    #[error("unknown attempt status: {0}")]
    UnknownStatus(String),
}

//
// ─── MODE & STATUS ─────────────────────────────────────────────────────────────
//

/// How an attempt is run.
///
/// Only practice reveals correctness per answer. Exam enables review flags and
/// is the only timed mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptMode {
    Practice,
    Exam,
    SpeedDrill,
}

impl AttemptMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptMode::Practice => "practice",
            AttemptMode::Exam => "exam",
            AttemptMode::SpeedDrill => "speed_drill",
        }
    }

    /// Whether per-answer correctness is revealed immediately.
    #[must_use]
    pub fn reveals_feedback(self) -> bool {
        matches!(self, AttemptMode::Practice)
    }

    /// Whether attempts in this mode run against a time limit.
    #[must_use]
    pub fn is_timed(self) -> bool {
        matches!(self, AttemptMode::Exam)
    }

    /// Whether questions can be flagged for review.
    #[must_use]
    pub fn allows_flags(self) -> bool {
        matches!(self, AttemptMode::Exam)
    }
}

impl fmt::Display for AttemptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptMode {
    type Err = AttemptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "practice" => Ok(Self::Practice),
            "exam" => Ok(Self::Exam),
            "speed_drill" => Ok(Self::SpeedDrill),
            other => Err(AttemptError::UnknownMode(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Grading,
    Completed,
}

impl AttemptStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Grading => "grading",
            AttemptStatus::Completed => "completed",
        }
    }

    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, AttemptStatus::InProgress)
    }
}

impl FromStr for AttemptStatus {
    type Err = AttemptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in_progress" => Ok(Self::InProgress),
            "grading" => Ok(Self::Grading),
            "completed" => Ok(Self::Completed),
            other => Err(AttemptError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One user's run through a test set, owned by the Attempt service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    id: AttemptId,
    mode: AttemptMode,
    status: AttemptStatus,
    total_questions: u32,
    started_at: DateTime<Utc>,
    time_limit_secs: Option<u32>,
}

impl Attempt {
    /// Creates a new in-progress attempt.
    ///
    /// The time limit is kept only for exam attempts; other modes are untimed.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` if `total_questions` is zero.
    /// Returns `AttemptError::InvalidTimeLimit` if a zero time limit is given.
    pub fn new(
        id: AttemptId,
        mode: AttemptMode,
        total_questions: u32,
        started_at: DateTime<Utc>,
        time_limit_secs: Option<u32>,
    ) -> Result<Self, AttemptError> {
        if total_questions == 0 {
            return Err(AttemptError::NoQuestions);
        }
        if time_limit_secs == Some(0) {
            return Err(AttemptError::InvalidTimeLimit);
        }
        Ok(Self {
            id,
            mode,
            status: AttemptStatus::InProgress,
            total_questions,
            started_at,
            time_limit_secs: time_limit_secs.filter(|_| mode.is_timed()),
        })
    }

    #[must_use]
    pub fn with_status(mut self, status: AttemptStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn id(&self) -> &AttemptId {
        &self.id
    }

    #[must_use]
    pub fn mode(&self) -> AttemptMode {
        self.mode
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rejects_empty_attempt() {
        let err = Attempt::new(AttemptId::new("A1"), AttemptMode::Exam, 0, fixed_now(), None)
            .unwrap_err();
        assert_eq!(err, AttemptError::NoQuestions);
    }

    #[test]
    fn rejects_zero_time_limit() {
        let err = Attempt::new(AttemptId::new("A1"), AttemptMode::Exam, 3, fixed_now(), Some(0))
            .unwrap_err();
        assert_eq!(err, AttemptError::InvalidTimeLimit);
    }

    #[test]
    fn only_exam_attempts_keep_a_time_limit() {
        let exam = Attempt::new(AttemptId::new("E"), AttemptMode::Exam, 3, fixed_now(), Some(600))
            .unwrap();
        assert_eq!(exam.time_limit_secs(), Some(600));

        for mode in [AttemptMode::Practice, AttemptMode::SpeedDrill] {
            let attempt = Attempt::new(AttemptId::new("P"), mode, 3, fixed_now(), Some(600)).unwrap();
            assert_eq!(attempt.time_limit_secs(), None);
        }
    }

    #[test]
    fn mode_wire_names_round_trip() {
        for mode in [AttemptMode::Practice, AttemptMode::Exam, AttemptMode::SpeedDrill] {
            assert_eq!(mode.as_str().parse::<AttemptMode>().unwrap(), mode);
        }
        assert!("marathon".parse::<AttemptMode>().is_err());
    }

    #[test]
    fn only_practice_reveals_feedback_and_only_exam_allows_flags() {
        assert!(!AttemptMode::Exam.reveals_feedback());
        assert!(AttemptMode::Exam.allows_flags());
        assert!(AttemptMode::Practice.reveals_feedback());
        assert!(!AttemptMode::Practice.allows_flags());
        assert!(!AttemptMode::SpeedDrill.reveals_feedback());
        assert!(!AttemptMode::SpeedDrill.allows_flags());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&AttemptStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
