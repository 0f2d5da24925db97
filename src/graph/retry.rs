use std::time::Duration;

/// Retries allowed after the first failed try.
pub const MAX_RETRIES: u32 = 5;
/// Upper bound on a single backoff delay.
pub const BACKOFF_CEILING: Duration = Duration::from_secs(60);

/// Exponential backoff with a ceiling, decided purely from the attempt count
/// and the status class of the last response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub ceiling: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            ceiling: BACKOFF_CEILING,
        }
    }
}

impl RetryPolicy {
    /// 429 and every 5xx are transient; everything else is final.
    pub fn is_retryable(status: u16) -> bool {
        status == 429 || (500..=599).contains(&status)
    }

    /// `min(ceiling, 2^attempt)` seconds; `attempt` starts at 1.
    pub fn delay(&self, attempt: u32) -> Duration {
        let secs = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_secs(secs).min(self.ceiling)
    }

    /// Delay before retry number `attempt`, or `None` when the response with
    /// `status` should be surfaced as-is.
    pub fn next_delay(&self, status: u16, attempt: u32) -> Option<Duration> {
        if !Self::is_retryable(status) || attempt > self.max_retries {
            return None;
        }
        Some(self.delay(attempt))
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
