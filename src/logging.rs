use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FILM_EXPLORER_LOG";
const DEFAULT_DIRECTIVE: &str = "film_explorer=info";

/// Log directory under the platform data dir, falling back to the temp dir.
pub fn log_dir() -> PathBuf {
    crate::config::project_dirs()
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("film-explorer").join("logs"))
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Daily log file; the terminal belongs to the TUI. Keep the guard alive
/// until exit so buffered lines are flushed.
pub fn init() -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("film-explorer")
        .filename_suffix("log")
        .build(&dir)?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter())
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| e as Box<dyn std::error::Error>)?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_is_absolute() {
        assert!(log_dir().is_absolute());
        assert!(log_dir().ends_with("logs"));
    }
}
