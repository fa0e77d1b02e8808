//! # cmdb-core
//!
//! Core types for the CMDB UI end-to-end harness.
//!
//! - [`RunConfig`]: process-wide configuration read from the environment
//! - [`CmdbError`] and [`FailureKind`]: one error type for every crate, with a
//!   classification that keeps configuration problems apart from regressions
//! - [`fail_open`]: helpers for best-effort diagnostics and teardown

pub mod config;
mod error;
pub mod fail_open;

pub use config::{ClientCertificateConfig, Credentials, RunConfig};
pub use error::{CmdbError, FailureKind, Result};
