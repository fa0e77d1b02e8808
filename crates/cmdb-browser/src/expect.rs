//! Expectations: bounded assertions over locators

use crate::error::Result;
use crate::locator::Locator;
use crate::wait::wait_until;
use std::time::Duration;
use tracing::debug;

/// Timeout used when an expectation does not set one
pub const DEFAULT_EXPECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Start an expectation on a locator
///
/// # Example
/// ```no_run
/// use cmdb_browser::{expect, Page};
/// use std::time::Duration;
///
/// async fn logged_in(page: &Page) -> cmdb_browser::Result<()> {
///     expect(&page.get_by_text("CMDB"))
///         .with_timeout(Duration::from_secs(15))
///         .to_be_visible()
///         .await
/// }
/// ```
pub fn expect(locator: &Locator) -> Expectation<'_> {
    Expectation {
        locator,
        timeout: DEFAULT_EXPECT_TIMEOUT,
    }
}

/// Pending assertion on a locator
pub struct Expectation<'a> {
    locator: &'a Locator,
    timeout: Duration,
}

impl<'a> Expectation<'a> {
    /// Override the timeout for this assertion
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The first match becomes visible
    pub async fn to_be_visible(self) -> Result<()> {
        debug!("Expecting {} to be visible", self.locator);
        let what = format!("{} to be visible", self.locator);
        wait_until(&what, self.timeout, || self.locator.is_visible()).await
    }

    /// No match is visible
    pub async fn to_be_hidden(self) -> Result<()> {
        let what = format!("{} to be hidden", self.locator);
        wait_until(&what, self.timeout, || async {
            Ok(self.locator.visible_count().await? == 0)
        })
        .await
    }

    /// The first match is enabled
    pub async fn to_be_enabled(self) -> Result<()> {
        let what = format!("{} to be enabled", self.locator);
        wait_until(&what, self.timeout, || self.locator.is_enabled()).await
    }
}
