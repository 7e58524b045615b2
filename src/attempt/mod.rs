// src/attempt/mod.rs

pub mod answers;
pub mod countdown;
pub mod runner;
pub mod state;

pub use answers::{AnswerSheet, Marker, Slot};
pub use countdown::{Countdown, format_time};
pub use runner::{AttemptObserver, AttemptRunner, Command, Outcome, open_attempt};
pub use state::{AttemptPhase, TestAttempt, TickOutcome};
