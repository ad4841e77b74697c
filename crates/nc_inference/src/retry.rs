use std::future::Future;

use nc_core::{Result, RetryPolicy};
use tracing::warn;

/// Runs `call`, retrying with exponential backoff only while it fails with a
/// rate-limit signature. Any other error is returned at once.
pub async fn retry_on_rate_limit<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_rate_limit() && attempt + 1 < attempts => {
                let wait = policy.wait_for(attempt);
                warn!(
                    "⏳ Rate limited ({}); retrying in {:.1}s ({}/{})",
                    e,
                    wait.as_secs_f64(),
                    attempt + 1,
                    attempts - 1
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_core::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn instant_policy() -> RetryPolicy {
        RetryPolicy {
            initial_wait: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    #[tokio::test]
    async fn test_succeeds_on_fifth_attempt_after_rate_limits() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = retry_on_rate_limit(&instant_policy(), move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 5 {
                Err(Error::RateLimited("429".to_string()))
            } else {
                Ok("done")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_other_failures_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result: Result<()> = retry_on_rate_limit(&instant_policy(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::GenerativeService("invalid request".to_string()))
        })
        .await;
        assert!(matches!(result, Err(Error::GenerativeService(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result: Result<()> = retry_on_rate_limit(&instant_policy(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::GenerativeService("Quota exceeded".to_string()))
        })
        .await;
        assert!(result.unwrap_err().is_rate_limit());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }
}
