//! Structured logging setup: console plus a `bot.log` file.

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;

/// Log file written next to the working directory.
pub const LOG_FILE: &str = "bot.log";

/// Builds the default filter: the configured level for this crate, warnings for the rest.
fn default_filter(level: LogLevel) -> String {
    let level = level.as_tracing_level().as_str().to_ascii_lowercase();
    format!("warn,{}={level}", env!("CARGO_CRATE_NAME"))
}

/// Opens `LOG_FILE` in `directory` (appending, never rotated) behind a non-blocking writer.
fn file_writer(directory: impl AsRef<Path>) -> Result<(NonBlocking, WorkerGuard), InitError> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence when set.
///
/// The returned guard flushes the log file when dropped and must live as long as the process.
pub fn init_tracing(level: LogLevel) -> Result<WorkerGuard, InitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let (file_writer, guard) = file_writer(".")?;

    let console_layer = fmt::layer().with_target(true);
    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::debug!(?level, "Tracing initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_default_filter_uses_configured_level() {
        assert_eq!(default_filter(LogLevel::Debug), "warn,discord_member_bot=debug");
        assert_eq!(default_filter(LogLevel::Critical), "warn,discord_member_bot=error");
    }

    #[test]
    fn test_file_writer_appends_to_bot_log() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LOG_FILE), "earlier line\n").unwrap();

        let (writer, guard) = file_writer(dir.path()).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(writer));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Successfully assigned role");
        });
        drop(guard);

        let contents = fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert!(contents.starts_with("earlier line\n"));
        assert!(contents.contains("Successfully assigned role"));
    }
}
