//! Screenshot capture using Chrome DevTools Protocol

use crate::error::{CmdbError, Result};
use crate::page::Page;
use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Scrollable document size, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DocumentSize {
    pub width: f64,
    pub height: f64,
}

impl DocumentSize {
    /// Clip rectangle covering the whole document
    pub fn clip(&self) -> Viewport {
        Viewport {
            x: 0.0,
            y: 0.0,
            width: self.width.max(1.0),
            height: self.height.max(1.0),
            scale: 1.0,
        }
    }
}

const DOCUMENT_SIZE_JS: &str = r#"JSON.stringify({
  width: Math.max(document.documentElement.scrollWidth, document.body ? document.body.scrollWidth : 0, window.innerWidth),
  height: Math.max(document.documentElement.scrollHeight, document.body ? document.body.scrollHeight : 0, window.innerHeight)
})"#;

/// Measure the scrollable size of the current document
pub async fn document_size(page: &Page) -> Result<DocumentSize> {
    let raw = page.evaluate(DOCUMENT_SIZE_JS).await?;
    let text = raw
        .as_str()
        .ok_or_else(|| CmdbError::Screenshot(format!("Unexpected document size payload: {}", raw)))?;
    Ok(serde_json::from_str(text)?)
}

/// Capture the whole document (not just the viewport) as PNG
pub async fn capture_full_page(page: &Page) -> Result<Vec<u8>> {
    let size = document_size(page).await?;
    debug!("Capturing full page screenshot ({}x{})", size.width, size.height);

    let tab = Arc::clone(page.tab());
    crate::run_blocking("screenshot", move || {
        tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, Some(size.clip()), true)
            .map_err(|e| CmdbError::Screenshot(format!("CDP capture failed: {}", e)))
    })
    .await
}

/// Capture a full-page PNG and write it to `path`
///
/// # Returns
/// Number of bytes written
pub async fn save_full_page(page: &Page, path: &Path) -> Result<u64> {
    let data = capture_full_page(page).await?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &data).await?;

    info!("Screenshot stored: {} ({} bytes)", path.display(), data.len());
    Ok(data.len() as u64)
}
