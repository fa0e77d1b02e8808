//! Test outcome records

use cmdb_core::{CmdbError, FailureKind};
use std::fmt;
use std::time::Duration;

/// Phase of a test invocation in which the outcome was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Context creation
    Setup,
    /// The scenario body
    Call,
    /// Context disposal
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Call => "call",
            Phase::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed { kind: FailureKind, message: String },
    Skipped(String),
}

impl TestStatus {
    /// Classify a scenario error
    pub fn from_error(err: &CmdbError) -> Self {
        match (err, err.kind()) {
            (CmdbError::Skipped(reason), _) => TestStatus::Skipped(reason.clone()),
            (other, kind) => TestStatus::Failed {
                kind: kind.unwrap_or(FailureKind::Assertion),
                message: other.to_string(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TestStatus::Failed { .. })
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => f.write_str("passed"),
            TestStatus::Failed { kind, message } => write!(f, "failed ({}): {}", kind, message),
            TestStatus::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

/// Outcome of one test invocation, as seen by post-test hooks
#[derive(Debug, Clone)]
pub struct TestReport {
    pub test_id: String,
    pub phase: Phase,
    pub status: TestStatus,
    pub duration: Duration,
}

impl TestReport {
    /// Whether this is a failure of the scenario body itself
    pub fn is_call_failure(&self) -> bool {
        self.phase == Phase::Call && self.status.is_failed()
    }
}

/// Totals for a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<TestReport>,
}

impl RunSummary {
    pub fn record(&mut self, report: TestReport) {
        self.reports.push(report);
    }

    pub fn passed(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(TestStatus::is_failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Skipped(_)))
    }

    /// True when nothing failed; skips do not count against the run
    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&TestStatus) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.status)).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}
