//! Browser process lifecycle using Chrome DevTools Protocol
//!
//! One [`BrowserProcess`] is launched per run and serves only as a factory
//! for isolated contexts. It is closed exactly once, either explicitly via
//! [`BrowserProcess::close`] or when the handle is dropped.

use crate::error::{cdp, CmdbError, Result};
use crate::relay::ClientCertRelay;
use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for browser launch
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Run in headless mode (default: true)
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Route traffic through the client-certificate relay
    pub client_cert_relay: bool,
    /// How long the CDP connection may stay silent before it is dropped.
    /// Must exceed the longest single test.
    pub idle_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            client_cert_relay: false,
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Handle to the single browser process of a run
pub struct BrowserProcess {
    browser: Option<Browser>,
    relay: Option<ClientCertRelay>,
}

impl BrowserProcess {
    /// Launch a browser with the given options
    ///
    /// Launch failure is an infrastructure error: callers abort the run.
    pub async fn launch(options: BrowserOptions) -> Result<Self> {
        info!(
            "Launching browser (headless: {}, size: {}x{}, cert relay: {})",
            options.headless, options.window_width, options.window_height, options.client_cert_relay
        );

        let relay = if options.client_cert_relay {
            Some(ClientCertRelay::start().await.map_err(|e| {
                CmdbError::BrowserLaunch(format!("client certificate relay did not start: {}", e))
            })?)
        } else {
            None
        };
        let proxy_arg = relay
            .as_ref()
            .map(|r| format!("--proxy-server=http://{}", r.local_addr()));

        let browser = crate::run_blocking("browser launch", move || {
            let mut built = LaunchOptions::default_builder()
                .headless(options.headless)
                .window_size(Some((options.window_width, options.window_height)))
                .ignore_certificate_errors(true)
                .idle_browser_timeout(options.idle_timeout)
                .build()
                .map_err(|e| CmdbError::BrowserLaunch(format!("invalid launch options: {}", e)))?;

            if let Some(ref arg) = proxy_arg {
                built.args.push(OsStr::new(arg));
            }

            Browser::new(built).map_err(|e| CmdbError::BrowserLaunch(e.to_string()))
        })
        .await?;

        info!("Browser launched successfully");

        Ok(Self {
            browser: Some(browser),
            relay,
        })
    }

    /// Underlying CDP browser handle
    pub(crate) fn browser(&self) -> Result<&Browser> {
        self.browser
            .as_ref()
            .ok_or_else(|| CmdbError::Browser("browser already closed".to_string()))
    }

    /// Client-certificate relay, present when launched with `client_cert_relay`
    pub fn relay(&self) -> Option<&ClientCertRelay> {
        self.relay.as_ref()
    }

    /// Browser version string as reported by CDP
    pub async fn version(&self) -> Result<String> {
        let browser = self.browser()?.clone();
        crate::run_blocking("browser version", move || {
            browser
                .get_version()
                .map(|v| v.product)
                .map_err(cdp("Failed to query browser version"))
        })
        .await
    }

    /// Close the browser process
    pub async fn close(mut self) -> Result<()> {
        self.shutdown();
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(browser) = self.browser.take() {
            info!("Closing browser process");
            // Dropping the last handle terminates the child process
            drop(browser);
        }
        if let Some(relay) = self.relay.take() {
            relay.stop();
        }
    }
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        if self.browser.is_some() {
            warn!("BrowserProcess dropped without close(), terminating browser");
            self.shutdown();
        } else {
            debug!("BrowserProcess dropped after close");
        }
    }
}
