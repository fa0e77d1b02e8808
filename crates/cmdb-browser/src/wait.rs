//! Bounded polling waits
//!
//! Every UI condition is awaited with an explicit timeout. Expiry turns into
//! a [`CmdbError::Timeout`], which the runner records as a test failure.

use cmdb_core::{CmdbError, FailureKind, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Delay between two evaluations of a condition
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `check` until it yields `true` or `timeout` expires
///
/// Browser errors raised by `check` (a document being replaced mid-query,
/// for instance) count as "not yet"; the last one is reported on timeout.
/// Configuration errors and skips are returned immediately.
pub async fn wait_until<F, Fut>(what: &str, timeout: Duration, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    let mut last_error: Option<String> = None;

    loop {
        match check().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) if e.kind() == Some(FailureKind::Assertion) => {
                debug!("Condition '{}' not evaluable yet: {}", what, e);
                last_error = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            let what = match last_error {
                Some(err) => format!("{} (last error: {})", what, err),
                None => what.to_string(),
            };
            return Err(CmdbError::timeout(what, timeout));
        }
        tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_resolves_once_condition_holds() {
        let calls = AtomicUsize::new(0);
        wait_until("third poll", Duration::from_secs(2), || async {
            Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2)
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_times_out_as_assertion_failure() {
        let err = wait_until("never", Duration::from_millis(250), || async { Ok(false) })
            .await
            .unwrap_err();
        assert!(matches!(err, CmdbError::Timeout { timeout_ms: 250, .. }));
        assert_eq!(err.kind(), Some(FailureKind::Assertion));
    }

    #[tokio::test]
    async fn test_browser_errors_are_retried_and_reported() {
        let err = wait_until("flaky", Duration::from_millis(250), || async {
            Err::<bool, _>(CmdbError::Browser("Execution context was destroyed".to_string()))
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Execution context was destroyed"));
    }

    #[tokio::test]
    async fn test_config_errors_are_not_swallowed() {
        let calls = AtomicUsize::new(0);
        let err = wait_until("config", Duration::from_secs(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<bool, _>(CmdbError::Config("missing".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CmdbError::Config(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
