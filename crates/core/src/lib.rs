#![forbid(unsafe_code)]

pub mod dictation;
pub mod model;
pub mod session;
pub mod time;
pub mod vocabulary;

pub use time::Clock;
