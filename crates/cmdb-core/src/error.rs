//! Unified error types for the CMDB harness

use thiserror::Error;

/// Unified error type for all harness operations
#[derive(Error, Debug)]
pub enum CmdbError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Browser errors
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Browser error: {0}")]
    Browser(String),

    // Assertion errors
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout after {timeout_ms}ms waiting for: {what}")]
    Timeout { what: String, timeout_ms: u64 },

    // Diagnostics errors
    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    // Relay errors
    #[error("Client certificate relay error: {0}")]
    Relay(String),

    /// Precondition for a scenario is absent; reported as skipped, never as passed
    #[error("Skipped: {0}")]
    Skipped(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a failure is reported.
///
/// Configuration problems are kept apart from assertion failures so a run
/// report tells "environment misconfigured" from "application regressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Missing or unusable run configuration
    Configuration,
    /// A UI condition did not hold within its timeout
    Assertion,
    /// The browser process could not be started; fatal to the run
    Infrastructure,
    /// Best-effort diagnostics capture failed
    Diagnostics,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Configuration => write!(f, "configuration"),
            FailureKind::Assertion => write!(f, "assertion"),
            FailureKind::Infrastructure => write!(f, "infrastructure"),
            FailureKind::Diagnostics => write!(f, "diagnostics"),
        }
    }
}

impl CmdbError {
    /// Failure classification, or `None` for a skip
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            CmdbError::Config(_) => Some(FailureKind::Configuration),
            CmdbError::BrowserLaunch(_) => Some(FailureKind::Infrastructure),
            CmdbError::Browser(_)
            | CmdbError::AssertionFailed(_)
            | CmdbError::Timeout { .. }
            | CmdbError::Relay(_)
            | CmdbError::Io(_)
            | CmdbError::Serialization(_) => Some(FailureKind::Assertion),
            CmdbError::Screenshot(_) => Some(FailureKind::Diagnostics),
            CmdbError::Skipped(_) => None,
        }
    }

    /// True when the error aborts the whole run rather than a single test
    pub fn is_fatal(&self) -> bool {
        self.kind() == Some(FailureKind::Infrastructure)
    }

    /// Build a timeout error for a named condition
    pub fn timeout(what: impl Into<String>, timeout: std::time::Duration) -> Self {
        CmdbError::Timeout {
            what: what.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

/// Result type alias using CmdbError
pub type Result<T> = std::result::Result<T, CmdbError>;
