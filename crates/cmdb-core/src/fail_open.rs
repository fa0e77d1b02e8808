//! Fail-open utilities for best-effort work
//!
//! Use these for diagnostics and teardown: capturing a failure screenshot,
//! disposing a browser context, stopping the certificate relay. Their errors
//! are logged and never replace the outcome of the test they serve.
//!
//! DO NOT use fail-open for:
//! - Scenario assertions (they are the test outcome)
//! - Configuration loading (misconfiguration must be reported)
//! - Browser launch (fatal to the run)

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an operation that should fail open
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// # Usage
///
/// ```no_run
/// use cmdb_core::fail_open::fail_open;
/// use cmdb_core::Result;
///
/// async fn capture() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let result = fail_open("failure_screenshot", || capture()).await;
///     // result is None if capture() failed, otherwise Some(())
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

/// Blocking counterpart of [`fail_open`], for `Drop` impls and other sync paths
pub fn fail_open_sync<F, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T>,
{
    match f() {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CmdbError;

    #[tokio::test]
    async fn test_fail_open_success() {
        let result = fail_open("test_op", || async { Ok::<_, CmdbError>(42) }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn test_fail_open_failure() {
        let result = fail_open("test_op", || async {
            Err::<i32, _>(CmdbError::Screenshot("page crashed".to_string()))
        })
        .await;
        assert_eq!(result, None);
    }

    #[test]
    fn test_fail_open_sync() {
        assert_eq!(fail_open_sync("ok", || Ok::<_, CmdbError>("done")), Some("done"));
        assert_eq!(
            fail_open_sync("err", || Err::<(), _>(CmdbError::Browser("gone".to_string()))),
            None
        );
    }
}
