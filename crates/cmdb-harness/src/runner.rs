//! Sequential test runner
//!
//! For every selected scenario the runner opens a fresh session (setup),
//! runs the body (call), hands the outcome to the hook pipeline, and closes
//! the session (teardown). The session is closed whatever the body did,
//! including panicking.

use crate::hooks::HookPipeline;
use crate::outcome::{Phase, RunSummary, TestReport, TestStatus};
use crate::scenario::Scenario;
use crate::session::SessionProvider;
use cmdb_core::{CmdbError, FailureKind, RunConfig};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs scenarios one after another against sessions from a provider
pub struct Runner<'a, P: SessionProvider> {
    provider: P,
    config: &'a RunConfig,
    hooks: HookPipeline<P::Session>,
    filter: Option<String>,
}

impl<'a, P: SessionProvider> Runner<'a, P> {
    pub fn new(provider: P, config: &'a RunConfig, hooks: HookPipeline<P::Session>) -> Self {
        Self {
            provider,
            config,
            hooks,
            filter: None,
        }
    }

    /// Only run scenarios whose id contains `filter`
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// Whether a scenario id passes the filter
    pub fn selects(&self, id: &str) -> bool {
        self.filter.as_deref().map_or(true, |f| id.contains(f))
    }

    /// Run every selected scenario in order
    pub async fn run(&self, scenarios: &[Box<dyn Scenario<P::Session>>]) -> RunSummary {
        let mut summary = RunSummary::default();

        for scenario in scenarios {
            let id = scenario.id();
            if !self.selects(&id) {
                continue;
            }
            let report = self.run_one(scenario.as_ref(), id).await;
            summary.record(report);
        }

        summary
    }

    async fn run_one(&self, scenario: &dyn Scenario<P::Session>, test_id: String) -> TestReport {
        info!("Test started: {}", test_id);
        let started = Instant::now();

        let session = match self.provider.open(self.config).await {
            Ok(session) => session,
            Err(e) => {
                let report = TestReport {
                    test_id,
                    phase: Phase::Setup,
                    status: TestStatus::from_error(&e),
                    duration: started.elapsed(),
                };
                log_report(&report);
                return report;
            }
        };

        let outcome = AssertUnwindSafe(scenario.run(&session, self.config))
            .catch_unwind()
            .await;
        let status = match outcome {
            Ok(Ok(())) => TestStatus::Passed,
            Ok(Err(e)) => TestStatus::from_error(&e),
            Err(panic) => TestStatus::Failed {
                kind: FailureKind::Assertion,
                message: format!("panicked: {}", panic_message(panic.as_ref())),
            },
        };

        let mut report = TestReport {
            test_id,
            phase: Phase::Call,
            status,
            duration: started.elapsed(),
        };

        self.hooks.execute_all(&report, &session, self.config).await;

        if let Err(e) = self.provider.close(session).await {
            if report.status.is_failed() {
                warn!("Teardown of {} also failed: {}", report.test_id, e);
            } else {
                report.phase = Phase::Teardown;
                report.status = TestStatus::from_error(&teardown_error(e));
            }
        }

        report.duration = started.elapsed();
        log_report(&report);
        report
    }
}

/// A skip raised during teardown is still a failure of the test
fn teardown_error(e: CmdbError) -> CmdbError {
    match e {
        CmdbError::Skipped(reason) => CmdbError::Browser(reason),
        other => other,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn log_report(report: &TestReport) {
    let secs = report.duration.as_secs_f64();
    match &report.status {
        TestStatus::Passed => info!("Test passed: {} ({:.1}s)", report.test_id, secs),
        TestStatus::Skipped(reason) => info!("Test skipped: {} ({})", report.test_id, reason),
        TestStatus::Failed { kind, message } => error!(
            "Test failed in {}: {} [{}] {} ({:.1}s)",
            report.phase, report.test_id, kind, message, secs
        ),
    }
}
