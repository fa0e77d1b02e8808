//! Locators: lazily resolved element queries
//!
//! A locator is a chain of steps evaluated in the page every time it is used,
//! so it always reflects the current DOM. Actions wait (bounded) for their
//! target to become visible before acting.

use crate::error::{CmdbError, Result};
use crate::page::{Page, ACTION_TIMEOUT};
use crate::wait::wait_until;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// One resolution step, applied to the elements produced by the previous one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Descendants matching a CSS selector
    Css { selector: String },
    /// Innermost descendants whose text matches
    Text { text: String, exact: bool },
    /// Descendants with an ARIA role whose accessible name contains `name`
    Role { role: String, name: String },
    /// Keep elements whose text contains the value
    HasText { text: String },
    /// Following siblings matching a CSS selector
    FollowingSibling { selector: String },
    /// Keep only the element at `index` (negative counts from the end)
    Nth { index: i64 },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Css { selector } => write!(f, "css={}", selector),
            Step::Text { text, exact: true } => write!(f, "text=\"{}\"", text),
            Step::Text { text, exact: false } => write!(f, "text={}", text),
            Step::Role { role, name } => write!(f, "role={}[name={:?}]", role, name),
            Step::HasText { text } => write!(f, "has-text={:?}", text),
            Step::FollowingSibling { selector } => write!(f, "following-sibling={}", selector),
            Step::Nth { index } => write!(f, "nth={}", index),
        }
    }
}

/// Element query bound to a page
#[derive(Clone)]
pub struct Locator {
    page: Page,
    steps: Vec<Step>,
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for step in &self.steps {
            if !first {
                write!(f, " >> ")?;
            }
            write!(f, "{}", step)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({})", self)
    }
}

impl Locator {
    pub(crate) fn new(page: Page, step: Step) -> Self {
        Self {
            page,
            steps: vec![step],
        }
    }

    fn then(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self {
            page: self.page.clone(),
            steps,
        }
    }

    /// Descendants matching a CSS selector
    pub fn locator(&self, selector: &str) -> Self {
        self.then(Step::Css {
            selector: selector.to_string(),
        })
    }

    /// Keep matches whose text contains `text`
    pub fn filter_has_text(&self, text: &str) -> Self {
        self.then(Step::HasText {
            text: text.to_string(),
        })
    }

    /// Following siblings of the matches that satisfy `selector`
    pub fn following_sibling(&self, selector: &str) -> Self {
        self.then(Step::FollowingSibling {
            selector: selector.to_string(),
        })
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }

    pub fn last(&self) -> Self {
        self.then(Step::Nth { index: -1 })
    }

    pub fn nth(&self, index: usize) -> Self {
        self.then(Step::Nth {
            index: index as i64,
        })
    }

    /// Number of matching elements right now
    pub async fn count(&self) -> Result<usize> {
        Ok(self.page.query(&self.steps, "count", "").await?.count)
    }

    /// Number of matching elements that are visible right now
    pub async fn visible_count(&self) -> Result<usize> {
        let reply = self.page.query(&self.steps, "visible_count", "").await?;
        Ok(reply.value.as_u64().unwrap_or(0) as usize)
    }

    /// Whether the first match exists and is visible
    pub async fn is_visible(&self) -> Result<bool> {
        let reply = self.page.query(&self.steps, "visible", "").await?;
        Ok(reply.value.as_bool().unwrap_or(false))
    }

    /// Whether the first match exists and is enabled
    pub async fn is_enabled(&self) -> Result<bool> {
        let reply = self.page.query(&self.steps, "enabled", "").await?;
        Ok(reply.value.as_bool().unwrap_or(false))
    }

    /// Text content of the first match
    pub async fn text_content(&self) -> Result<Option<String>> {
        let reply = self.page.query(&self.steps, "text", "").await?;
        Ok(reply.value.as_str().map(str::to_string))
    }

    /// Attribute of the first match; `None` when absent
    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        let reply = self.page.query(&self.steps, "attribute", name).await?;
        Ok(reply.value.as_str().map(str::to_string))
    }

    /// Attribute of every match, in document order
    pub async fn all_attributes(&self, name: &str) -> Result<Vec<Option<String>>> {
        let reply = self.page.query(&self.steps, "attributes", name).await?;
        let values = reply
            .value
            .as_array()
            .map(|items| items.iter().map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        Ok(values)
    }

    /// Wait until the first match is visible
    pub async fn wait_for(&self, timeout: Duration) -> Result<()> {
        wait_until(&format!("{} to be visible", self), timeout, || self.is_visible()).await
    }

    /// Click the first match with a real mouse event
    pub async fn click(&self) -> Result<()> {
        self.wait_for(ACTION_TIMEOUT).await?;
        debug!("Clicking {}", self);
        if self.page.click_first(&self.steps).await? {
            Ok(())
        } else {
            Err(CmdbError::Browser(format!("Element detached before click: {}", self)))
        }
    }

    /// Double-click the first match
    pub async fn dblclick(&self) -> Result<()> {
        self.wait_for(ACTION_TIMEOUT).await?;
        debug!("Double-clicking {}", self);
        let reply = self.page.query(&self.steps, "dblclick", "").await?;
        if reply.found {
            Ok(())
        } else {
            Err(CmdbError::Browser(format!("Element detached before double-click: {}", self)))
        }
    }

    /// Replace the value of an input and fire `input`/`change`
    pub async fn fill(&self, value: &str) -> Result<()> {
        self.wait_for(ACTION_TIMEOUT).await?;
        debug!("Filling {}", self);
        let reply = self.page.query(&self.steps, "fill", value).await?;
        if reply.found {
            Ok(())
        } else {
            Err(CmdbError::Browser(format!("Element detached before fill: {}", self)))
        }
    }
}
