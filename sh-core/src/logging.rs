//! Structured logging setup using the `tracing` ecosystem.
//!
//! Console output goes to stderr so that `--format json` output on stdout
//! stays machine-readable. File output rotates daily.

use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::constants::LOG_FILE_NAME;
use crate::error::ShResult;

/// Guard that keeps the non-blocking log writer alive.
/// Drop this to flush and close the log file.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Build the filter from an explicit level, falling back to `info`.
///
/// `RUST_LOG` wins over the configured level when it is set.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// `level_override` replaces the configured level (the CLI passes `debug`
/// for `--verbose`).
pub fn init_logging(
    config: &LoggingConfig,
    log_dir: &Path,
    level_override: Option<&str>,
) -> ShResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let level = level_override.unwrap_or(&config.level);
    let file_appender = rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(console_layer);

    if config.json_output {
        registry
            .with(
                fmt::layer()
                    .with_writer(non_blocking)
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true),
            )
            .init();
    }

    tracing::debug!("logging initialized at level={level}, dir={}", log_dir.display());

    Ok(LogGuard { _guard: guard })
}

/// Initialize a minimal console-only logger for tests or when no log
/// directory is writable. Subsequent calls are no-ops.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
