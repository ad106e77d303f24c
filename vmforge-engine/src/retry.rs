//! Bounded retry with exponential backoff
//!
//! Network-bound operations (disk import, every control-plane call) are
//! retried on transient transport errors only; permanent rejections fail
//! immediately. Exhausting the attempt budget converts the last transient
//! error into the stage's normal failure path.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use vmforge_client::ClientError;

use crate::error::GenerateError;

/// Retry budget for network-bound operations.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Run `op` until it succeeds, fails permanently or the budget runs out.
pub(crate) async fn call_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, GenerateError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut delay = policy.initial_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let err = GenerateError::from(err);
                if !err.is_transient() || attempt >= policy.max_attempts {
                    return Err(err);
                }

                warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:?}",
                    what, attempt, policy.max_attempts, err, delay
                );
                tokio::time::sleep(delay).await;

                // Exponential backoff with cap
                delay = (delay * 2).min(policy.max_backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(fast_policy(), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ClientError::api_error(503, "busy"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_fail_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry(fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::api_error(400, "nope")) }
        })
        .await;

        assert!(matches!(result, Err(GenerateError::PermanentTransport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_transient_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry(fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::api_error(503, "still busy")) }
        })
        .await;

        assert!(matches!(result, Err(GenerateError::TransientTransport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
