//! Process-wide logging setup
//!
//! Installs a tracing subscriber with two sinks: a timestamped run log under
//! the artifact directory and the console. Both receive the same lines:
//!
//! ```text
//! 2026-10-19 14:03:11 - cmdb_harness::runner - INFO - Test passed: smoke::test_login_success
//! ```

use chrono::Local;
use cmdb_core::{CmdbError, Result};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Timestamp format of log lines
pub const LINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format used in artifact file names
pub const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

static RUN_LOG: OnceLock<PathBuf> = OnceLock::new();

/// `<time> - <target> - <LEVEL> - <message>` line format
struct RunLogFormat;

impl<S, N> FormatEvent<S, N> for RunLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "{} - {} - {} - ",
            Local::now().format(LINE_TIME_FORMAT),
            meta.target(),
            meta.level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Path of the run log for a given start time
pub fn run_log_path(artifacts_dir: &Path, started: chrono::DateTime<Local>) -> PathBuf {
    artifacts_dir.join(format!("run_{}.log", started.format(FILE_TIME_FORMAT)))
}

/// Initialize logging once for the process
///
/// Creates the artifact directory and `run_<YYYYMMDD_HHMMSS>.log`, then
/// mirrors every event to it and to the console. Calling this again returns
/// the path chosen by the first call and leaves the subscriber untouched.
/// The level filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_logging(artifacts_dir: &Path) -> Result<PathBuf> {
    if let Some(existing) = RUN_LOG.get() {
        return Ok(existing.clone());
    }

    std::fs::create_dir_all(artifacts_dir)?;
    let path = run_log_path(artifacts_dir, Local::now());
    let file: File = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(RunLogFormat)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(RunLogFormat)
        .with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| CmdbError::Config(format!("A global logger is already installed: {}", e)))?;

    let path = RUN_LOG.get_or_init(|| path).clone();
    tracing::info!("Log file: {}", path.display());
    Ok(path)
}

/// Path returned by the first successful [`init_logging`], if any
pub fn current_log_path() -> Option<&'static Path> {
    RUN_LOG.get().map(PathBuf::as_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_run_log_path_format() {
        let started = Local.with_ymd_and_hms(2026, 10, 19, 9, 5, 7).unwrap();
        let path = run_log_path(Path::new("artifacts"), started);
        assert_eq!(path, PathBuf::from("artifacts/run_20261019_090507.log"));
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = init_logging(dir.path()).unwrap();
        let second = init_logging(Path::new("elsewhere")).unwrap();
        assert_eq!(first, second);
        assert!(first.exists());
        assert_eq!(current_log_path(), Some(first.as_path()));

        tracing::error!("written to the run log");
        let content = std::fs::read_to_string(&first).unwrap();
        assert!(content.contains(" - ERROR - written to the run log"));
    }
}
