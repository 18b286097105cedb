mod answer;
mod attempt;
mod essay;
mod ids;
mod question;
mod submission;

pub use answer::{Answer, AnswerFeedback, AnswerResponse};
pub use attempt::{Attempt, AttemptError, AttemptMode, AttemptStatus};
pub use essay::Essays;
pub use ids::{AttemptId, ParseIdError, QuestionId, WordId};
pub use question::{CefrLevel, Question, QuestionError, QuestionOption, QuestionType};
pub use submission::{Submission, SubmissionReceipt, SubmitTrigger};
