mod progress;
mod service;
mod ticker;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::AttemptSession;
pub use ticker::{TickEvent, Ticker};
pub use workflow::{AttemptLoopService, DEFAULT_DRAFT_MAX_AGE_SECS, TickReport};
