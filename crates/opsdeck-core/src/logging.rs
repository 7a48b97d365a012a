//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV_VAR: &str = "OPSDECK_LOG";

const DEFAULT_FILTER: &str = "opsdeck=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/opsdeck/logs/`. stdout is left alone
/// because headless mode writes NDJSON there.
/// Log level is controlled by `OPSDECK_LOG` environment variable.
///
/// # Examples
/// ```bash
/// OPSDECK_LOG=debug cargo run
/// OPSDECK_LOG=opsdeck_app=trace cargo run
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "opsdeck.log");

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| Error::LoggingInit(e.to_string()))?;

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("opsdeck starting");
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Default to info, allow override via OPSDECK_LOG
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("opsdeck").join("logs"))
}

/// Get the log file path for the current day
pub fn get_current_log_file() -> Result<PathBuf> {
    let dir = get_log_directory()?;
    Ok(dir.join("opsdeck.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_lives_under_opsdeck_logs() {
        let path = get_current_log_file().unwrap();
        assert!(path.ends_with("opsdeck/logs/opsdeck.log"));
    }
}
