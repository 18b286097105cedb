use serde::{Deserialize, Serialize};

use crate::model::attempt::AttemptMode;
use crate::model::ids::QuestionId;

/// What the user actually submitted for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerResponse {
    /// Key of the selected option of a multiple-choice question.
    Choice(String),
    /// Free text for writing or transcribed speaking tasks.
    Text(String),
}

impl AnswerResponse {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            AnswerResponse::Choice(key) | AnswerResponse::Text(key) => key,
        }
    }
}

/// Correctness revealed by the Attempt service in practice mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_key: String,
}

/// A submitted response. Re-answering a question replaces the previous value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    question_id: QuestionId,
    question_number: u32,
    response: AnswerResponse,
    feedback: Option<AnswerFeedback>,
}

impl Answer {
    #[must_use]
    pub fn new(question_id: QuestionId, question_number: u32, response: AnswerResponse) -> Self {
        Self {
            question_id,
            question_number,
            response,
            feedback: None,
        }
    }

    #[must_use]
    pub fn with_feedback(mut self, feedback: AnswerFeedback) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Drop correctness for modes that only reveal it after grading.
    #[must_use]
    pub fn for_mode(mut self, mode: AttemptMode) -> Self {
        if !mode.reveals_feedback() {
            self.feedback = None;
        }
        self
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn question_number(&self) -> u32 {
        self.question_number
    }

    #[must_use]
    pub fn response(&self) -> &AnswerResponse {
        &self.response
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.feedback.as_ref().map(|f| f.is_correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graded() -> Answer {
        Answer::new(QuestionId::new("q1"), 1, AnswerResponse::Choice("b".into())).with_feedback(
            AnswerFeedback {
                is_correct: false,
                correct_key: "c".into(),
            },
        )
    }

    #[test]
    fn non_practice_modes_strip_feedback() {
        assert_eq!(graded().for_mode(AttemptMode::Exam).is_correct(), None);
        assert_eq!(graded().for_mode(AttemptMode::SpeedDrill).feedback(), None);
    }

    #[test]
    fn practice_mode_keeps_feedback() {
        let answer = graded().for_mode(AttemptMode::Practice);
        assert_eq!(answer.is_correct(), Some(false));
        assert_eq!(answer.feedback().unwrap().correct_key, "c");
    }

    #[test]
    fn response_serializes_tagged() {
        let json = serde_json::to_string(&AnswerResponse::Text("Bonjour".into())).unwrap();
        assert_eq!(json, r#"{"kind":"text","value":"Bonjour"}"#);
    }
}
