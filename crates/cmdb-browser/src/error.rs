//! Browser error types - re-exports the unified CmdbError from cmdb-core
//!
//! Browser operations use these variants:
//! - BrowserLaunch(String) - the Chromium process could not be started (fatal to the run)
//! - Browser(String) - CDP calls, navigation, element resolution
//! - Timeout { what, timeout_ms } - a bounded wait expired
//! - Screenshot(String) - capture failures
//! - Relay(String) - client-certificate relay failures

pub use cmdb_core::{CmdbError, Result};

/// Alias kept for call sites that read better with a browser-specific name
pub type BrowserError = CmdbError;

/// Map a headless_chrome error into a `Browser` error with context
pub(crate) fn cdp<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> CmdbError + '_ {
    move |e| CmdbError::Browser(format!("{}: {}", context, e))
}
