//! A cooperative single-shot timer.
//!
//! There is no thread behind it. The owner arms a deadline and whoever runs
//! the event loop asks whether it is due. Cancelling is just forgetting the
//! deadline, so a cancelled tick costs nothing.

use std::time::{Duration, Instant};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OneShot {
    deadline: Option<Instant>,
}

impl OneShot {
    pub fn arm(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Disarms and returns the deadline if it has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<Instant> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.deadline.take(),
            _ => None,
        }
    }

    /// Time left until the deadline, zero if overdue, `None` if disarmed.
    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}
