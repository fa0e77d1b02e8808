//! Test-session harness for the CMDB UI suite
//!
//! Owns the run lifecycle around the browser layer:
//!
//! - [`logging`]: process-wide run log plus console
//! - [`session`]: one isolated browser context per test
//! - [`auth`]: form and certificate login, session-expiry check
//! - [`runner`]: sequential setup / call / teardown with panic capture
//! - [`hooks`]: fail-open post-test observers, failure screenshots
//! - [`suite`]: the whole run, from logging to browser shutdown

pub mod auth;
pub mod hooks;
pub mod logging;
pub mod outcome;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod suite;

pub use auth::AuthStrategy;
pub use hooks::{HookPipeline, HookResult, PostTestHook, ScreenshotOnFailure};
pub use logging::init_logging;
pub use outcome::{Phase, RunSummary, TestReport, TestStatus};
pub use runner::Runner;
pub use scenario::{FnScenario, Scenario, ScenarioFn};
pub use session::{BrowserSessionProvider, SessionProvider};
pub use suite::run_suite;
