//! Logging setup and the log capability handed to the ingestion pipeline.
//!
//! [`init`] installs a global tracing subscriber that writes to stdout and a
//! per-launch log file under the application directory. Pipeline code never
//! reaches for that global directly; it logs through an [`IngestionLog`]
//! passed in at construction, with [`TracingLog`] bridging into `tracing`.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    time::SystemTime,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing::{Level, Subscriber};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs;

/// Maximum number of log files to retain.
const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "churnpipe";

/// Sink for pipeline progress messages.
pub trait IngestionLog {
    /// Record `message` at `level`.
    fn log(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }
}

/// [`IngestionLog`] that forwards to the global `tracing` dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl IngestionLog for TracingLog {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "churnpipe::ingestion", "{message}"),
            Level::WARN => tracing::warn!(target: "churnpipe::ingestion", "{message}"),
            Level::INFO => tracing::info!(target: "churnpipe::ingestion", "{message}"),
            Level::DEBUG => tracing::debug!(target: "churnpipe::ingestion", "{message}"),
            _ => tracing::trace!(target: "churnpipe::ingestion", "{message}"),
        }
    }
}

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The application log directory could not be resolved or created.
    #[error("Failed to prepare log directory: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    /// Failed to enumerate existing log files for pruning.
    #[error("Failed to read log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to remove an obsolete log file.
    #[error("Failed to remove old log file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to format a timestamp for the log filename.
    #[error("Failed to format log filename time: {0}")]
    FormatTime(time::error::Format),
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
    /// Failed to create the initial log file for this launch.
    #[error("Failed to create log file at {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Keeps the log file writer alive. Buffered lines are flushed when this is
/// dropped, so hold it until the process is about to exit.
#[must_use = "dropping the handle stops file logging"]
pub struct LogHandle {
    path: PathBuf,
    _guard: WorkerGuard,
}

impl LogHandle {
    /// Path of this launch's log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Initialize tracing to write to stdout and a per-launch log file.
///
/// Fails if a global subscriber is already installed. Failures are returned
/// so the binary can keep running with logging disabled.
pub fn init() -> Result<LogHandle, LoggingError> {
    let log_dir = app_dirs::logs_dir()?;
    let (subscriber, handle) = build_subscriber(&log_dir)?;
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
    tracing::debug!("Logging initialized; log file at {}", handle.path.display());
    Ok(handle)
}

fn build_subscriber(
    log_dir: &Path,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogHandle), LoggingError> {
    let log_file_name = format_log_file_name(now_local_or_utc())?;
    let log_path = log_dir.join(&log_file_name);
    ensure_file_exists(&log_path)?;

    let file_appender = rolling::never(log_dir, log_file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    prune_old_logs(log_dir, MAX_LOG_FILES)?;

    let timer = build_timer();
    let stdout_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_writer(std::io::stdout);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);

    let subscriber = Registry::default()
        .with(build_env_filter())
        .with(stdout_layer)
        .with(file_layer);
    let handle = LogHandle {
        path: log_path,
        _guard: guard,
    };
    Ok((subscriber, handle))
}

fn ensure_file_exists(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn prune_old_logs(dir: &Path, max_files: usize) -> Result<(), LoggingError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("log"))
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|(modified, _)| *modified);
    let excess = entries.len().saturating_sub(max_files);
    for (_, path) in entries.into_iter().take(excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(())
}

fn format_log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let name = now.format(NAME_FORMAT).map_err(LoggingError::FormatTime)?;
    Ok(format!("{LOG_FILE_PREFIX}_{name}.log"))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{thread, time::Duration};
    use tempfile::tempdir;

    #[test]
    fn log_filename_has_timestamp_and_prefix() {
        let fixed = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let name = format_log_file_name(fixed).unwrap();
        assert_eq!(name, "churnpipe_2023-11-14_22-13-20.log");
    }

    #[test]
    fn file_receives_events_once_handle_is_dropped() {
        let dir = tempdir().unwrap();
        let (subscriber, handle) = build_subscriber(dir.path()).unwrap();
        let path = handle.path().to_path_buf();
        assert!(path.starts_with(dir.path()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("raw dataset missing from 01_Raw");
        });
        drop(handle);

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("raw dataset missing from 01_Raw"));
        assert!(contents.contains("ERROR"));
    }

    #[test]
    fn prune_keeps_newest_files_and_ignores_other_extensions() {
        let dir = tempdir().unwrap();
        for idx in 0..5 {
            ensure_file_exists(&dir.path().join(format!("churnpipe_{idx}.log"))).unwrap();
            thread::sleep(Duration::from_millis(10));
        }
        ensure_file_exists(&dir.path().join("notes.txt")).unwrap();

        prune_old_logs(dir.path(), 3).unwrap();

        let mut remaining = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                "churnpipe_2.log".to_string(),
                "churnpipe_3.log".to_string(),
                "churnpipe_4.log".to_string(),
                "notes.txt".to_string(),
            ]
        );
    }
}
