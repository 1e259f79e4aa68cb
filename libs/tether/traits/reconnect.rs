use std::time::Duration;

/// Capped linear reconnect policy
///
/// Every attempt waits the same interval, including the first one, and at
/// most `max_attempts` attempts are made per reconnect. Both values are
/// constants chosen by the caller; nothing adapts to observed failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    interval: Duration,
    max_attempts: usize,
}

impl ReconnectPolicy {
    /// Create a new policy
    ///
    /// # Arguments
    /// * `interval` - Sleep before each attempt
    /// * `max_attempts` - Attempts per reconnect (validated positive by the builder)
    pub fn new(interval: Duration, max_attempts: usize) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Delay before the given attempt (1-indexed)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long, then dial
    /// * `None` - Attempts exhausted
    pub fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if self.should_reconnect(attempt) {
            Some(self.interval)
        } else {
            None
        }
    }

    /// Whether the given attempt (1-indexed) is allowed
    pub fn should_reconnect(&self, attempt: usize) -> bool {
        attempt >= 1 && attempt <= self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 100)
    }
}
