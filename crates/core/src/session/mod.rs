//! Building blocks of an attempt session: answers, navigation, review flags, and the timer.
//!
//! Each component is a plain value owned by the session that uses it. None of them
//! perform I/O.

mod cursor;
mod flags;
mod ledger;
mod timer;

pub use cursor::NavigationCursor;
pub use flags::FlagSet;
pub use ledger::AnswerLedger;
pub use timer::{ExamTimer, ExpireCallback, TickOutcome, TimerState, TimerUrgency};
