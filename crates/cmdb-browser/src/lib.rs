//! Browser automation for the CMDB UI end-to-end harness
//!
//! This crate drives Chromium over the Chrome DevTools Protocol (CDP) and
//! provides the session/context layer the harness builds on.
//!
//! # Features
//!
//! - **Browser Process**: one Chromium instance per run, closed exactly once
//! - **Browsing Contexts**: an isolated incognito context with one page per test
//! - **Locators and Expectations**: lazily resolved element queries and
//!   bounded assertions over them
//! - **Screenshots**: full-page PNG capture
//! - **Client Certificates**: a local relay presenting a PKCS#12 identity to
//!   the application origin
//!
//! # Example
//!
//! ```no_run
//! use cmdb_browser::{expect, BrowserOptions, BrowserProcess, BrowsingContext};
//! use cmdb_core::RunConfig;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::from_env()?;
//!     let browser = BrowserProcess::launch(BrowserOptions {
//!         client_cert_relay: config.has_certificate(),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//!     let context = BrowsingContext::create(&browser, &config).await?;
//!     let page = context.page();
//!     page.goto("/").await?;
//!     expect(&page.locator("[name=\"login\"]"))
//!         .with_timeout(Duration::from_secs(10))
//!         .to_be_visible()
//!         .await?;
//!
//!     context.close().await?;
//!     browser.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Requirements
//!
//! - Chrome or Chromium installed (or downloadable by `headless_chrome`)
//!
//! # Architecture
//!
//! - [`browser`]: browser process lifecycle
//! - [`context`]: isolated contexts and their teardown
//! - [`page`]: navigation, cookies, scripting
//! - [`locator`]: element queries and actions
//! - [`expect`]: bounded assertions
//! - [`wait`]: the polling primitive behind every wait
//! - [`screenshot`]: full-page capture
//! - [`relay`]: client-certificate relay
//! - [`error`]: error types for browser operations

pub mod browser;
pub mod context;
pub mod error;
pub mod expect;
pub mod locator;
pub mod page;
pub mod relay;
pub mod screenshot;
pub mod wait;

// Re-export commonly used types
pub use browser::{BrowserOptions, BrowserProcess};
pub use context::BrowsingContext;
pub use error::{BrowserError, CmdbError, Result};
pub use expect::{expect, Expectation, DEFAULT_EXPECT_TIMEOUT};
pub use locator::{Locator, Step};
pub use page::Page;
pub use relay::{ClientCertRelay, ProxyRequest, RelayRegistration};
pub use screenshot::{capture_full_page, save_full_page};
pub use wait::wait_until;

/// Run a blocking CDP call on the blocking thread pool
///
/// headless_chrome is synchronous and must not block the async workers the
/// relay runs on.
pub(crate) async fn run_blocking<T, F>(label: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CmdbError::Browser(format!("{} task failed: {}", label, e)))?
}
