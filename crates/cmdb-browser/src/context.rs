//! Isolated browsing contexts
//!
//! A [`BrowsingContext`] is an incognito browser context with exactly one
//! page. It belongs to a single test invocation and is never reused: it is
//! disposed by [`BrowsingContext::close`], or by `Drop` if the owner unwinds.

use crate::browser::BrowserProcess;
use crate::error::{cdp, CmdbError, Result};
use crate::page::Page;
use crate::relay::RelayRegistration;
use cmdb_core::fail_open::fail_open_sync;
use cmdb_core::RunConfig;
use headless_chrome::protocol::cdp::Target;
use std::sync::Arc;
use tracing::{debug, info};

/// One isolated browser context and its page
pub struct BrowsingContext {
    id: String,
    page: Page,
    certificate: Option<RelayRegistration>,
    closed: bool,
}

impl BrowsingContext {
    /// Create a context bound to the configured base URL
    ///
    /// When the run has a client certificate, it is loaded and presented to
    /// the base origin (and only to it) for as long as the context lives.
    pub async fn create(browser: &BrowserProcess, config: &RunConfig) -> Result<Self> {
        let certificate = match &config.certificate {
            Some(cert) => {
                let relay = browser.relay().ok_or_else(|| {
                    CmdbError::Config(
                        "client certificate configured but the browser was launched without the relay".to_string(),
                    )
                })?;
                let der = tokio::fs::read(&cert.pfx_path).await.map_err(|e| {
                    CmdbError::Config(format!(
                        "Cannot read client certificate {}: {}",
                        cert.pfx_path.display(),
                        e
                    ))
                })?;
                Some(relay.register(&config.origin_authority(), &der, &cert.passphrase)?)
            }
            None => None,
        };

        let cdp_browser = browser.browser()?.clone();
        let (id, tab) = crate::run_blocking("context create", move || {
            let context = cdp_browser
                .new_context()
                .map_err(cdp("Failed to create browser context"))?;
            let id = context.get_id().to_string();
            let tab = context.new_tab().map_err(cdp("Failed to create tab"))?;
            Ok((id, tab))
        })
        .await?;

        info!(
            "Browser context {} created for {} (client certificate: {})",
            id,
            config.base_url,
            certificate.is_some()
        );

        Ok(Self {
            id,
            page: Page::new(tab, config.base_url.clone()),
            certificate,
            closed: false,
        })
    }

    /// The context's only page
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Delete every cookie stored by this context
    pub async fn clear_cookies(&self) -> Result<()> {
        self.page.clear_cookies().await
    }

    /// Dispose the context and its page
    pub async fn close(mut self) -> Result<()> {
        self.closed = true;
        let tab = Arc::clone(self.page.tab());
        let id = self.id.clone();
        crate::run_blocking("context close", move || dispose(&tab, &id)).await?;
        self.certificate.take();
        info!("Browser context {} closed", self.id);
        Ok(())
    }
}

fn dispose(tab: &headless_chrome::Tab, id: &str) -> Result<()> {
    match tab.call_method(Target::DisposeBrowserContext {
        browser_context_id: id.to_string(),
    }) {
        Ok(_) => Ok(()),
        Err(e) => {
            // Some builds refuse browser-level Target calls from a page
            // session; closing the only page still ends the context.
            debug!("DisposeBrowserContext for {} refused ({}), closing tab", id, e);
            tab.close(true)
                .map(|_| ())
                .map_err(cdp("Failed to close tab"))
        }
    }
}

impl Drop for BrowsingContext {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            let tab = Arc::clone(self.page.tab());
            fail_open_sync("context dispose on drop", || dispose(&tab, &self.id));
        }
    }
}
