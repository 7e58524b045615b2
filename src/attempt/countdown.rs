// src/attempt/countdown.rs

/// Local, display-only countdown of the seconds left in an attempt.
///
/// Seeded from the server's `timeLeft` and decremented by one per tick.
/// Never goes below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
}

impl Countdown {
    /// Negative server values (an overdue attempt) clamp to zero.
    pub fn new(seconds: i64) -> Self {
        Self {
            remaining: seconds.max(0) as u64,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_zero(&self) -> bool {
        self.remaining == 0
    }

    /// Removes one second and returns what is left.
    pub fn tick(&mut self) -> u64 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }
}

/// Formats seconds as `MM:SS`; minutes keep growing past 99.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
