//! Tracing subscriber initialization.
//!
//! The engine runs inside a host UI, so logs go to a file rather than
//! stdout. Only `vrows` events are kept by default; host crates sharing the
//! process stay quiet unless `RUST_LOG` asks for them.
//!
//! Useful filters:
//!
//! - `RUST_LOG=vrows::engine::scheduler=debug` shows every rebuild, deferral
//!   and freeze;
//! - `RUST_LOG=vrows::engine::pool=trace` shows each row constructed;
//! - `RUST_LOG=vrows::engine::aggregate=warn` reports only timed-out rounds.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "vrows=info";

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file's directory could not be created.
    #[error("cannot create log directory {path:?}: {source}")]
    DirectoryCreation {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The path does not name a file inside a directory.
    #[error("log path {0:?} does not name a file")]
    InvalidPath(PathBuf),

    /// Another subscriber already owns the process.
    #[error("tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Filter for `directives`, or [`DEFAULT_FILTER`] when they are absent or
/// do not parse.
pub fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Split `log_path` into its directory and file name.
fn split_log_path(log_path: &Path) -> Result<(&Path, &str), LoggingError> {
    let invalid = || LoggingError::InvalidPath(log_path.to_path_buf());
    let file_name = log_path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    let directory = log_path.parent().ok_or_else(invalid)?;
    Ok((directory, file_name))
}

/// Install a file-backed subscriber filtered by `RUST_LOG`.
///
/// Creates the log directory if needed. Aggregation workers log under
/// their thread names (`vrows-aggregate-N`).
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    let (directory, file_name) = split_log_path(log_path)?;
    std::fs::create_dir_all(directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.to_path_buf(),
        source,
    })?;

    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let file_appender = tracing_appender::rolling::never(directory, file_name);

    tracing_subscriber::fmt()
        .with_env_filter(filter_from(env.as_deref()))
        .with_writer(file_appender)
        .with_thread_names(true)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn default_filter_is_info_for_this_crate() {
        assert!(DEFAULT_FILTER.starts_with("vrows="));
        assert_eq!(filter_from(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn unparsable_directives_fall_back_to_default() {
        let filter = filter_from(Some("vrows=loudest"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn module_directives_are_kept() {
        let filter = filter_from(Some("vrows::engine::scheduler=debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn log_path_splits_into_directory_and_file() {
        let (dir, file) = split_log_path(Path::new("/var/log/vrows/engine.log")).expect("valid path");
        assert_eq!(dir, Path::new("/var/log/vrows"));
        assert_eq!(file, "engine.log");
    }

    #[test]
    fn root_is_not_a_log_file() {
        assert!(matches!(
            split_log_path(Path::new("/")),
            Err(LoggingError::InvalidPath(_))
        ));
    }

    #[test]
    #[serial(tracing_init)]
    fn init_creates_directory_then_refuses_second_subscriber() {
        let dir = std::env::temp_dir().join("vrows_logging_init");
        let _ = fs::remove_dir_all(&dir);
        let log_file = dir.join("engine.log");

        // Another test binary may already have installed a subscriber.
        let _ = init(&log_file);
        assert!(dir.exists(), "log directory created at {:?}", dir);

        let second = init(&log_file);
        assert!(
            matches!(second, Err(LoggingError::SubscriberAlreadySet)),
            "got {:?}",
            second
        );

        let _ = fs::remove_dir_all(&dir);
    }
}
