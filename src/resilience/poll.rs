//! Bounded fixed-interval polling.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Fixed schedule for repeated status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two consecutive checks.
    pub interval: Duration,
    /// Maximum number of checks, including the first one.
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self { interval, max_attempts }
    }

    pub fn from_millis(interval_ms: u64, max_attempts: u32) -> Self {
        Self::new(Duration::from_millis(interval_ms), max_attempts)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_millis(500, 5)
    }
}

/// Result of a poll loop that did not error.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The terminal predicate accepted `value`.
    Settled { value: T, attempts: u32 },
    /// Attempts ran out; `last` is the final observation.
    Exhausted { last: T, attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Settled { attempts, .. } | PollOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    /// The last observed value, settled or not.
    pub fn into_inner(self) -> T {
        match self {
            PollOutcome::Settled { value, .. } => value,
            PollOutcome::Exhausted { last, .. } => last,
        }
    }
}

/// Call `fetch` until `is_terminal` accepts a value or the policy runs out.
///
/// The first check happens immediately; `policy.interval` is slept between
/// checks, never after the last one. A `fetch` error ends the loop at once.
/// `fetch` receives the 1-based attempt number.
pub async fn poll_until<T, E, F, Fut, P>(
    policy: &PollPolicy,
    mut fetch: F,
    is_terminal: P,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let value = fetch(attempt).await?;
        if is_terminal(&value) {
            return Ok(PollOutcome::Settled { value, attempts: attempt });
        }
        if attempt >= max_attempts {
            return Ok(PollOutcome::Exhausted { last: value, attempts: attempt });
        }

        tracing::trace!(attempt, delay = ?policy.interval, "Poll not settled, waiting");
        sleep(policy.interval).await;
        attempt += 1;
    }
}
