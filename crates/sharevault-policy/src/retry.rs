//! Bounded retry with exponential backoff for policy engine calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use sharevault_core::error::AppError;
use sharevault_core::result::AppResult;

/// Outcome of a single call attempt.
#[derive(Debug)]
pub(crate) enum CallError {
    /// May succeed on retry (connect failure, timeout, 5xx).
    Transient(AppError),
    /// Retrying cannot help (credential rejection).
    Permanent(AppError),
}

/// Run `attempt` up to `max_attempts` times, sleeping between transient
/// failures with a doubling backoff. Permanent failures return
/// immediately.
pub(crate) async fn with_retry<T, F, Fut>(
    operation: &str,
    max_attempts: u32,
    initial_backoff: Duration,
    mut attempt: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut backoff = initial_backoff;

    for attempt_no in 1..=max_attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(CallError::Permanent(err)) => return Err(err),
            Err(CallError::Transient(err)) => {
                if attempt_no == max_attempts {
                    return Err(err);
                }
                warn!(
                    operation,
                    attempt = attempt_no,
                    error = %err,
                    "Transient policy engine failure, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
    }

    unreachable!("retry loop returns within the final attempt")
}
