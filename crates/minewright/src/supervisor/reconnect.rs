//! Reconnect backoff bookkeeping.

use std::time::Duration;

use crate::config::ReconnectConfig;

/// Counts reconnect schedulings and computes the capped linear backoff.
///
/// The count resets only on a successful spawn; once it reaches the
/// configured maximum, no further reconnect may ever be scheduled.
#[derive(Debug)]
pub struct ReconnectState {
    attempts: u32,
    max_attempts: u32,
    step: Duration,
    cap: Duration,
}

impl ReconnectState {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            attempts: 0,
            max_attempts: config.max_attempts,
            step: Duration::from_millis(config.step_ms),
            cap: Duration::from_millis(config.cap_delay_ms),
        }
    }

    /// Schedulings consumed since the last successful spawn.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The delay the next scheduling would wait: grows by one step per
    /// consumed attempt, up to the cap.
    pub fn current_delay(&self) -> Duration {
        (self.step * self.attempts).min(self.cap)
    }

    /// Decide the next reconnect.
    ///
    /// `Some(delay)` consumes one attempt; `None` means the budget is spent
    /// and the caller must never create another session.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        let delay = self.current_delay();
        self.attempts += 1;
        Some(delay)
    }

    /// A successful spawn restores the full budget.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
