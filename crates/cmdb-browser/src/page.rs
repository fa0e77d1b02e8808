//! Page: the single tab of a browsing context

use crate::error::{cdp, CmdbError, Result};
use crate::locator::{Locator, Step};
use headless_chrome::browser::tab::point::Point;
use headless_chrome::protocol::cdp::Network;
use headless_chrome::Tab;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Locator engine evaluated in the page
const LOCATOR_JS: &str = include_str!("locator.js");

/// Navigation timeout applied to every CDP wait on the tab
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// How long actions (click, fill) wait for their target to become visible
pub const ACTION_TIMEOUT: Duration = Duration::from_secs(10);

static MARK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Result of running the locator engine once
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EngineReply {
    /// Whether at least one element matched
    pub found: bool,
    /// Number of matched elements
    pub count: usize,
    /// Operation-specific payload
    pub value: serde_json::Value,
}

/// Active page within a browsing context
#[derive(Clone)]
pub struct Page {
    tab: Arc<Tab>,
    base_url: Url,
}

impl Page {
    pub(crate) fn new(tab: Arc<Tab>, base_url: Url) -> Self {
        tab.set_default_timeout(NAVIGATION_TIMEOUT);
        Self { tab, base_url }
    }

    /// Underlying CDP tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Navigate to a path relative to the base URL, or to an absolute URL
    pub async fn goto(&self, target: &str) -> Result<()> {
        let url = self
            .base_url
            .join(target)
            .map_err(|e| CmdbError::Browser(format!("Cannot resolve {}: {}", target, e)))?;
        debug!("Navigating to {}", url);

        let tab = Arc::clone(&self.tab);
        let nav_url = url.to_string();
        crate::run_blocking("navigate", move || {
            tab.navigate_to(&nav_url)
                .map_err(|e| CmdbError::Browser(format!("Failed to navigate to {}: {}", nav_url, e)))?;
            tab.wait_until_navigated()
                .map_err(|e| CmdbError::Browser(format!("Navigation timeout for {}: {}", nav_url, e)))?;
            Ok(())
        })
        .await?;

        info!("Navigated to {}", url);
        Ok(())
    }

    /// Reload the current document
    pub async fn reload(&self) -> Result<()> {
        debug!("Reloading page");
        let tab = Arc::clone(&self.tab);
        crate::run_blocking("reload", move || {
            tab.reload(false, None).map_err(cdp("Failed to reload"))?;
            tab.wait_until_navigated().map_err(cdp("Reload timeout"))?;
            Ok(())
        })
        .await
    }

    /// Go one entry back in session history
    pub async fn go_back(&self) -> Result<()> {
        debug!("Going back in history");
        let tab = Arc::clone(&self.tab);
        crate::run_blocking("history back", move || {
            tab.evaluate("history.back()", false).map_err(cdp("Failed to go back"))?;
            tab.wait_until_navigated().map_err(cdp("Back navigation timeout"))?;
            Ok(())
        })
        .await
    }

    /// Execute JavaScript in the page context
    ///
    /// # Returns
    /// JSON result from JavaScript execution (primitives only; use
    /// `JSON.stringify` for structured values)
    pub async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let tab = Arc::clone(&self.tab);
        let script = script.to_string();
        crate::run_blocking("evaluate", move || {
            let result = tab
                .evaluate(&script, false)
                .map_err(cdp("JavaScript evaluation failed"))?;
            Ok(result.value.unwrap_or(serde_json::Value::Null))
        })
        .await
    }

    /// Replace the current document with `html`
    pub async fn set_content(&self, html: &str) -> Result<()> {
        let script = format!(
            "document.open(); document.write({}); document.close();",
            serde_json::to_string(html)?
        );
        self.evaluate(&script).await?;
        Ok(())
    }

    /// Click a viewport coordinate with a real mouse event
    pub async fn click_at(&self, x: f64, y: f64) -> Result<()> {
        debug!("Clicking at ({}, {})", x, y);
        let tab = Arc::clone(&self.tab);
        crate::run_blocking("click point", move || {
            tab.click_point(Point { x, y })
                .map_err(cdp("Failed to click point"))?;
            Ok(())
        })
        .await
    }

    /// Fixed pause, for settling animations between steps
    pub async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Delete every cookie of the browsing context this page belongs to
    pub async fn clear_cookies(&self) -> Result<()> {
        info!("Clearing context cookies");
        let tab = Arc::clone(&self.tab);
        crate::run_blocking("clear cookies", move || {
            tab.call_method(Network::ClearBrowserCookies(None))
                .map_err(cdp("Failed to clear cookies"))?;
            Ok(())
        })
        .await
    }

    /// Wait until an element matching `selector` is visible
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.locator(selector).wait_for(timeout).await
    }

    /// Elements matching a CSS selector
    pub fn locator(&self, selector: &str) -> Locator {
        Locator::new(
            self.clone(),
            Step::Css {
                selector: selector.to_string(),
            },
        )
    }

    /// Innermost elements whose text contains `text` (case-insensitive)
    pub fn get_by_text(&self, text: &str) -> Locator {
        Locator::new(
            self.clone(),
            Step::Text {
                text: text.to_string(),
                exact: false,
            },
        )
    }

    /// Innermost elements whose whole text equals `text`
    pub fn get_by_text_exact(&self, text: &str) -> Locator {
        Locator::new(
            self.clone(),
            Step::Text {
                text: text.to_string(),
                exact: true,
            },
        )
    }

    /// Elements with an ARIA role whose accessible name contains `name`
    pub fn get_by_role(&self, role: &str, name: &str) -> Locator {
        Locator::new(
            self.clone(),
            Step::Role {
                role: role.to_string(),
                name: name.to_string(),
            },
        )
    }

    /// Run the locator engine with one operation
    pub(crate) async fn query(&self, steps: &[Step], op: &str, arg: &str) -> Result<EngineReply> {
        let expression = format!(
            "{}({}, {}, {})",
            LOCATOR_JS.trim_end(),
            serde_json::to_string(steps)?,
            serde_json::to_string(op)?,
            serde_json::to_string(arg)?
        );
        let raw = self.evaluate(&expression).await?;
        let text = raw.as_str().ok_or_else(|| {
            CmdbError::Browser(format!("Locator engine returned a non-string value: {}", raw))
        })?;
        Ok(serde_json::from_str(text)?)
    }

    /// Click the first element matched by `steps` with a real mouse event
    pub(crate) async fn click_first(&self, steps: &[Step]) -> Result<bool> {
        let token = format!("t{}", MARK_SEQ.fetch_add(1, Ordering::Relaxed));
        let marked = self.query(steps, "mark", &token).await?;
        if !marked.found {
            return Ok(false);
        }

        let tab = Arc::clone(&self.tab);
        crate::run_blocking("click", move || {
            let selector = format!("[data-cmdb-target=\"{}\"]", token);
            let element = tab
                .find_element(&selector)
                .map_err(cdp("Marked element vanished before click"))?;
            element.click().map_err(cdp("Click failed"))?;
            Ok(())
        })
        .await?;
        Ok(true)
    }
}
