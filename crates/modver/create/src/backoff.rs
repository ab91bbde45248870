//! Constant backoff policy and a retry-until-terminal combinator
//!
//! Works for any submit-then-poll workflow: the operation reports
//! `Attempt::Pending` until it is done, the combinator owns the waiting and
//! the overall time budget.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Fixed delay between steps, bounded by a budget for the whole attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff {
    delay: Duration,
    timeout: Duration,
}

impl ConstantBackoff {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(15);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

    pub fn new(delay: Duration, timeout: Duration) -> Self {
        Self { delay, timeout }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True once `elapsed` has used up the budget
    pub fn is_expired(&self, elapsed: Duration) -> bool {
        elapsed >= self.timeout
    }
}

impl Default for ConstantBackoff {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY, Self::DEFAULT_TIMEOUT)
    }
}

/// Result of one step of a resumable operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Pending,
    Done(T),
}

/// An operation that advances one unit of work per call
#[async_trait]
pub trait Resumable: Send {
    type Output: Send;
    type Error: Send;

    /// Run one step. `elapsed` is the time the operation has consumed so far.
    async fn step(&mut self, elapsed: Duration) -> Result<Attempt<Self::Output>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The step itself failed; the loop stopped at once
    #[error("{0}")]
    Step(E),

    #[error("no terminal state after {elapsed:?} (budget {timeout:?})")]
    TimedOut { elapsed: Duration, timeout: Duration },
}

/// Drive `operation` until it is done, fails, or exhausts the policy's budget.
///
/// `already_elapsed` lets a resumed operation keep the budget it started with.
pub async fn retry_until_terminal<R: Resumable>(
    policy: &ConstantBackoff,
    operation: &mut R,
    already_elapsed: Duration,
) -> Result<R::Output, RetryError<R::Error>> {
    let mut elapsed = already_elapsed;
    loop {
        let started = Instant::now();
        if let Attempt::Done(output) = operation.step(elapsed).await.map_err(RetryError::Step)? {
            return Ok(output);
        }

        tokio::time::sleep(policy.delay()).await;
        elapsed = elapsed.saturating_add(started.elapsed());

        if policy.is_expired(elapsed) {
            return Err(RetryError::TimedOut {
                elapsed,
                timeout: policy.timeout(),
            });
        }
    }
}
