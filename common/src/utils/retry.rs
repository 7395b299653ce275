use std::{
    future::Future,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use tokio_retry::{strategy::FixedInterval, RetryIf};
use tracing::warn;

/// Fixed-delay retry policy: `max_attempts` tries in total, `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no retries.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// How a retried operation ended.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: usize },
    /// Every allowed attempt failed with a retryable error.
    Exhausted { error: E, attempts: usize },
    /// The operation failed with an error the predicate refused to retry.
    Rejected { error: E, attempts: usize },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> usize {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Rejected { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Succeeded { value, .. } => Ok(value),
            Self::Exhausted { error, .. } | Self::Rejected { error, .. } => Err(error),
        }
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt budget is spent.
pub async fn retry_with_policy<T, E, Op, Fut, P>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut is_retryable: P,
    mut operation: Op,
) -> RetryOutcome<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
    E: std::fmt::Display,
{
    let attempts = AtomicUsize::new(0);
    let max_attempts = policy.max_attempts.max(1);
    let strategy = FixedInterval::new(policy.delay).take(max_attempts.saturating_sub(1));

    let result = RetryIf::spawn(
        strategy,
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            operation()
        },
        |err: &E| {
            let attempt = attempts.load(Ordering::SeqCst);
            if !is_retryable(err) {
                return false;
            }
            if attempt < max_attempts {
                warn!(
                    operation = operation_name,
                    attempt,
                    next_attempt = attempt.saturating_add(1),
                    error = %err,
                    "Retrying operation"
                );
            }
            true
        },
    )
    .await;

    let attempts = attempts.load(Ordering::SeqCst);
    match result {
        Ok(value) => RetryOutcome::Succeeded { value, attempts },
        Err(error) if is_retryable(&error) => {
            warn!(
                operation = operation_name,
                attempts,
                error = %error,
                "Operation failed after exhausting retries"
            );
            RetryOutcome::Exhausted { error, attempts }
        }
        Err(error) => RetryOutcome::Rejected { error, attempts },
    }
}
