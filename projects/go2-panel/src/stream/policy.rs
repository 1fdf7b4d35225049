use std::time::Duration;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// How the stream connector schedules a new attempt after a close.
///
/// The delay never grows. `max_attempts` counts consecutive failed attempts;
/// `None` retries forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn immediate() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before retry number `attempt` (1-based), or `None` once exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt > max => None,
            _ => Some(self.delay),
        }
    }

    /// Records one more consecutive failure and returns the delay before retrying.
    /// The counter saturates, so an unbounded policy keeps retrying forever.
    pub fn after_failure(&self, failures: &mut u32) -> Option<Duration> {
        *failures = failures.saturating_add(1);
        self.delay_for(*failures)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}
