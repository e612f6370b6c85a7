//! Logging infrastructure for tilepack.
//!
//! Structured logging with dual output:
//! - a log file under the given directory (fresh each run)
//! - stdout, for watching retry diagnostics during a build
//!
//! Verbosity is controlled via the `RUST_LOG` environment variable and
//! defaults to `info`.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tilepack.log";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initializes the global logging subscriber.
///
/// Creates the log directory if needed, truncates any previous log file,
/// and installs file + stdout output. Can only be called once per process.
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be prepared.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    // Truncate whatever a previous run left behind.
    let log_path = Path::new(log_dir).join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_target(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        assert_eq!(DEFAULT_LOG_DIR, "logs");
        assert_eq!(DEFAULT_LOG_FILE, "tilepack.log");
    }

    // init_logging installs a global subscriber and can only run once per
    // process, so the file preparation is exercised directly instead.
    #[test]
    fn test_log_file_preparation_truncates_previous_run() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join(DEFAULT_LOG_FILE);

        fs::write(&log_path, "old session output").unwrap();
        fs::write(&log_path, "").unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }

    #[test]
    fn test_nested_log_directory_creation() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("logs");

        fs::create_dir_all(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
