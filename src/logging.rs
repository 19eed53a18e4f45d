//! Logging configuration with journald support on Linux.
//!
//! The TUI owns the terminal, so logs never go to stdout/stderr there: they
//! go to systemd's journal on Linux, or to a daily file otherwise. The
//! headless renderer logs to stderr instead.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "FLICKMAP_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging for the TUI.
///
/// On Linux, this will attempt to connect to systemd-journald.
/// If unavailable or on other platforms, logs go to `log_dir` (or the local
/// data directory) as `flickmap.log`, rotated daily.
///
/// Log level can be controlled via the `FLICKMAP_LOG` environment variable:
/// - `FLICKMAP_LOG=debug` for verbose output (filters, cache hits, sampling)
/// - `FLICKMAP_LOG=info` for standard output (default)
/// - `FLICKMAP_LOG=warn` for warnings and errors only
pub fn init(log_dir: Option<PathBuf>) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        // Try to use journald on Linux
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(journald_layer)
                .try_init()?;

            tracing::info!("Logging initialized with journald backend");
            return Ok(());
        }
    }

    // Fallback to file-based logging
    let log_dir = log_dir.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flickmap")
            .join("logs")
    });

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "flickmap.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the life of the process
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    tracing::info!("Logging initialized with file backend at {:?}", log_dir);
    Ok(())
}

/// Initialize logging to stderr, for one-shot command line use.
pub fn init_stderr() -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}
