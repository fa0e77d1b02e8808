//! Hook pipeline for post-test callbacks
//!
//! Hooks run after every test body with the outcome and the still-open
//! session. The pipeline is fail-open: a failing hook is logged and the
//! remaining hooks still run. A hook never changes the test outcome.

use crate::logging::FILE_TIME_FORMAT;
use crate::outcome::TestReport;
use async_trait::async_trait;
use chrono::Local;
use cmdb_browser::BrowsingContext;
use cmdb_core::{Result, RunConfig};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Result from hook execution
#[derive(Debug, Clone)]
pub struct HookResult {
    /// Whether the hook succeeded
    pub success: bool,
    /// Message describing what happened
    pub message: String,
}

impl HookResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Observer invoked after each test body
#[async_trait]
pub trait PostTestHook<S: Sync>: Send + Sync {
    /// Hook name used in logs
    fn name(&self) -> &str;

    /// Implementations handle their own errors and return a failure result
    /// instead of propagating them.
    async fn execute(&self, report: &TestReport, session: &S, config: &RunConfig) -> HookResult;
}

/// Ordered, fail-open collection of post-test hooks
pub struct HookPipeline<S: Sync> {
    hooks: Vec<Box<dyn PostTestHook<S>>>,
}

impl<S: Sync> HookPipeline<S> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn add_hook(&mut self, hook: Box<dyn PostTestHook<S>>) {
        self.hooks.push(hook);
    }

    /// Execute all hooks in order; failures are logged, never propagated
    pub async fn execute_all(&self, report: &TestReport, session: &S, config: &RunConfig) -> Vec<HookResult> {
        let mut results = Vec::with_capacity(self.hooks.len());

        for hook in &self.hooks {
            let result = hook.execute(report, session, config).await;
            if result.success {
                info!("Hook {} succeeded: {}", hook.name(), result.message);
            } else {
                warn!("Hook {} failed (continuing): {}", hook.name(), result.message);
            }
            results.push(result);
        }

        results
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl<S: Sync> Default for HookPipeline<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A session that can write a full-page screenshot of its page
#[async_trait]
pub trait FullPageCapture: Send + Sync {
    async fn save_full_page(&self, path: &Path) -> Result<u64>;
}

#[async_trait]
impl FullPageCapture for BrowsingContext {
    async fn save_full_page(&self, path: &Path) -> Result<u64> {
        cmdb_browser::save_full_page(self.page(), path).await
    }
}

/// Replace characters that are unsafe in file names with `_`
pub fn sanitize_test_id(test_id: &str) -> String {
    test_id
        .replace("::", "_")
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `FAIL_<test-id>_<YYYYMMDD_HHMMSS>.png` inside `dir`
pub fn failure_screenshot_path(dir: &Path, test_id: &str, at: chrono::DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "FAIL_{}_{}.png",
        sanitize_test_id(test_id),
        at.format(FILE_TIME_FORMAT)
    ))
}

/// Captures a full-page screenshot when a test body fails
///
/// Setup and teardown failures, passes and skips are ignored. A capture
/// error is logged and reported as a hook failure; the test keeps its
/// original outcome.
pub struct ScreenshotOnFailure;

#[async_trait]
impl<S: FullPageCapture> PostTestHook<S> for ScreenshotOnFailure {
    fn name(&self) -> &str {
        "screenshot-on-failure"
    }

    async fn execute(&self, report: &TestReport, session: &S, config: &RunConfig) -> HookResult {
        if !report.is_call_failure() {
            return HookResult::success("no call-phase failure");
        }

        let dir = config.screenshots_dir();
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            error!("Cannot create {}: {}", dir.display(), e);
            return HookResult::failure(format!("screenshot directory unavailable: {}", e));
        }

        let path = failure_screenshot_path(&dir, &report.test_id, Local::now());
        match session.save_full_page(&path).await {
            Ok(_) => {
                info!("Failure screenshot: {}", path.display());
                HookResult::success(format!("saved {}", path.display()))
            }
            Err(e) => {
                error!("Failure screenshot for {} not captured: {}", report.test_id, e);
                HookResult::failure(e.to_string())
            }
        }
    }
}
