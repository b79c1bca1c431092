//! Fail-open helpers for operations that must never decide a run's outcome
//!
//! Use these for notifications and per-element bridge payloads: failures are
//! logged via `tracing::warn!` and swallowed.
//!
//! DO NOT use fail-open for:
//! - Navigation and extraction during replay
//! - Baseline persistence
//! - Screenshot artifact writes

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::Result;

/// Log and discard an item-level error on the recording path
pub fn fail_open_sync<T>(operation_name: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

/// Backoff unit between attempts; attempt `n` waits `n` units
pub const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Run an async operation up to `attempts` times, waiting
/// [`RETRY_BACKOFF`] times the attempt number between tries (linear
/// backoff). The last error is logged and discarded.
///
/// ```no_run
/// use snapcheck_core::fail_open::fail_open_with_retries;
/// use snapcheck_core::Result;
///
/// async fn notify() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let sent = fail_open_with_retries("failure_notifier", || notify(), 3).await;
///     // sent is None if every attempt failed
/// }
/// ```
pub async fn fail_open_with_retries<F, Fut, T>(operation_name: &str, mut f: F, attempts: usize) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        let err = match f().await {
            Ok(val) => return Some(val),
            Err(e) => e,
        };

        if attempt >= attempts {
            warn!("{} gave up after {} attempts (fail-open): {}", operation_name, attempt, err);
            return None;
        }

        warn!("{} attempt {}/{} failed: {}", operation_name, attempt, attempts, err);
        tokio::time::sleep(RETRY_BACKOFF * attempt as u32).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnapcheckError;

    #[test]
    fn test_fail_open_sync_drops_error() {
        let bad: Result<i32> = Err(SnapcheckError::Bridge("bad payload".to_string()));
        assert_eq!(fail_open_sync("bridge_item", bad), None);
        assert_eq!(fail_open_sync("bridge_item", Ok(7)), Some(7));
    }

    #[tokio::test]
    async fn test_notifier_retry_recovers() {
        let mut attempts = 0;
        let result = fail_open_with_retries(
            "failure_notifier",
            || {
                attempts += 1;
                async move {
                    if attempts < 2 {
                        Err(SnapcheckError::Other("webhook returned 503".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            },
            3,
        )
        .await;
        assert_eq!(result, Some(42));
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn test_notifier_gives_up_quietly() {
        let mut attempts = 0;
        let result = fail_open_with_retries(
            "failure_notifier",
            || {
                attempts += 1;
                async move { Err::<i32, _>(SnapcheckError::Other("webhook unreachable".to_string())) }
            },
            3,
        )
        .await;
        assert_eq!(result, None);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_backoff_grows_linearly() {
        let started = std::time::Instant::now();
        let result = fail_open_with_retries(
            "failure_notifier",
            || async { Err::<(), _>(SnapcheckError::Other("webhook returned 502".to_string())) },
            3,
        )
        .await;

        assert_eq!(result, None);
        // 1 unit after the first failure, 2 after the second, none after the last
        assert!(started.elapsed() >= RETRY_BACKOFF * 3);
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_wait() {
        let started = std::time::Instant::now();
        let result = fail_open_with_retries(
            "failure_notifier",
            || async { Err::<(), _>(SnapcheckError::Other("down".to_string())) },
            1,
        )
        .await;

        assert_eq!(result, None);
        assert!(started.elapsed() < RETRY_BACKOFF);
    }
}
