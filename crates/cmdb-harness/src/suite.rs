//! Whole-run driver: logging, browser lifecycle, runner

use crate::hooks::{HookPipeline, ScreenshotOnFailure};
use crate::logging::init_logging;
use crate::outcome::RunSummary;
use crate::runner::Runner;
use crate::scenario::Scenario;
use crate::session::BrowserSessionProvider;
use cmdb_browser::{BrowserOptions, BrowserProcess, BrowsingContext};
use cmdb_core::fail_open::fail_open;
use cmdb_core::{Result, RunConfig};
use tracing::info;

/// Browser launch options for a run
pub fn browser_options(config: &RunConfig) -> BrowserOptions {
    BrowserOptions {
        headless: config.headless,
        client_cert_relay: config.has_certificate(),
        ..Default::default()
    }
}

/// Run a suite of browser scenarios end to end
///
/// Initializes logging, launches one browser for the whole run, runs the
/// selected scenarios with failure screenshots enabled, and closes the
/// browser once. A browser that cannot be launched fails the run with
/// `CmdbError::BrowserLaunch`; everything else is reported per test.
pub async fn run_suite(
    config: &RunConfig,
    scenarios: &[Box<dyn Scenario<BrowsingContext>>],
    filter: Option<String>,
) -> Result<RunSummary> {
    init_logging(&config.artifacts_dir)?;
    info!("Test run started against {}", config.base_url);

    let browser = BrowserProcess::launch(browser_options(config)).await?;
    if let Ok(version) = browser.version().await {
        info!("Browser: {}", version);
    }

    let mut hooks: HookPipeline<BrowsingContext> = HookPipeline::new();
    hooks.add_hook(Box::new(ScreenshotOnFailure));

    let summary = {
        let runner = Runner::new(BrowserSessionProvider::new(&browser), config, hooks).with_filter(filter);
        runner.run(scenarios).await
    };

    fail_open("browser close", || browser.close()).await;

    info!(
        "Test run finished: {} (status: {})",
        summary,
        if summary.success() { "ok" } else { "failed" }
    );
    Ok(summary)
}
