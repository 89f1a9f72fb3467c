use crate::domain::ports::Sleeper;
use crate::utils::error::{HarvestError, Result};
use std::future::Future;
use std::time::Duration;

/// Fixed exponential backoff: `base_delay * 2^attempt` after each failed
/// attempt, at most `max_attempts` attempts in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Where a retried operation stands. `Attempting` carries the zero-based
/// index of the attempt about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting(u32),
    Succeeded,
    Exhausted,
}

impl RetryPolicy {
    pub fn start(&self) -> RetryState {
        if self.max_attempts == 0 {
            RetryState::Exhausted
        } else {
            RetryState::Attempting(0)
        }
    }

    /// Transition after the current attempt finished. Terminal states stay put.
    pub fn next_state(&self, state: RetryState, succeeded: bool) -> RetryState {
        match state {
            RetryState::Attempting(_) if succeeded => RetryState::Succeeded,
            RetryState::Attempting(n) if n + 1 < self.max_attempts => RetryState::Attempting(n + 1),
            RetryState::Attempting(_) => RetryState::Exhausted,
            terminal => terminal,
        }
    }

    /// Delay to wait after zero-based `attempt` failed: 1s, 2s, 4s, ... for
    /// the default base.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Drives `operation` through the policy's state machine, sleeping between
/// failed attempts. `operation` receives the zero-based attempt index.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    label: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut state = policy.start();
    let mut attempts = 0;
    let mut last_error = String::from("no attempt was made");

    while let RetryState::Attempting(attempt) = state {
        attempts += 1;
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(
                    "    Error downloading {} (Attempt {}/{}): {}",
                    label,
                    attempt + 1,
                    policy.max_attempts,
                    e
                );
                last_error = e.to_string();
                state = policy.next_state(state, false);
                if let RetryState::Attempting(_) = state {
                    let delay = policy.backoff(attempt);
                    tracing::debug!("Backing off {:?} before retrying {}", delay, label);
                    sleeper.sleep(delay).await;
                }
            }
        }
    }

    Err(HarvestError::RetriesExhausted {
        attempts,
        last_error,
    })
}
