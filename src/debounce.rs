// Resize debounce
// One pending deadline; rescheduling replaces it

use std::time::{Duration, Instant};

/// Delay between the last resize notification and the re-render
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(50);

/// Trailing-edge debouncer holding at most one pending deadline
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Cancel whatever is pending and schedule a new deadline `delay` from `now`
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once, the first time `now` reaches the deadline
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}
