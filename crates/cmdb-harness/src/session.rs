//! Per-test session provisioning

use async_trait::async_trait;
use cmdb_browser::{BrowserProcess, BrowsingContext};
use cmdb_core::{Result, RunConfig};

/// Issues one fresh session per test and tears it down afterwards
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: Send + Sync;

    async fn open(&self, config: &RunConfig) -> Result<Self::Session>;

    async fn close(&self, session: Self::Session) -> Result<()>;
}

/// Provides an isolated browser context per test from a shared browser
pub struct BrowserSessionProvider<'b> {
    browser: &'b BrowserProcess,
}

impl<'b> BrowserSessionProvider<'b> {
    pub fn new(browser: &'b BrowserProcess) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl<'b> SessionProvider for BrowserSessionProvider<'b> {
    type Session = BrowsingContext;

    async fn open(&self, config: &RunConfig) -> Result<BrowsingContext> {
        BrowsingContext::create(self.browser, config).await
    }

    async fn close(&self, session: BrowsingContext) -> Result<()> {
        session.close().await
    }
}
