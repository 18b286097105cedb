use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::Answer;
use crate::model::attempt::AttemptStatus;
use crate::model::essay::Essays;
use crate::model::ids::AttemptId;

/// What caused a final submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    Manual,
    Expired,
}

/// Final payload handed to the Attempt service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub answers: Vec<Answer>,
    pub essays: Essays,
    pub elapsed_secs: u64,
    pub trigger: SubmitTrigger,
}

/// Result returned by the Attempt service for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub attempt_id: AttemptId,
    pub status: AttemptStatus,
    pub correct: u32,
    pub graded: u32,
    pub submitted_at: DateTime<Utc>,
}
