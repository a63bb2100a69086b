//! Logging setup for each command mode

use chrono::Local;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Batch log, appended to under `--log_dir`.
pub const LOG_FILE: &str = "preprocess.log";

/// `yyyy-MM-dd HH:mm:ss.SSS` in local time.
struct LogTimer;

impl FormatTime for LogTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

fn filter(verbose: bool) -> EnvFilter {
    let log_level = if verbose { "debug" } else { "info" };
    EnvFilter::new(format!("qscore={}", log_level))
}

pub fn init_console(verbose: bool) {
    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt::layer().with_timer(LogTimer))
        .init();
}

/// Console plus `<log_dir>/preprocess.log`. Workers share the file through
/// one mutex, so lines from concurrent projects never interleave mid-line.
pub fn init_batch(log_dir: &Path, verbose: bool) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt::layer().with_timer(LogTimer))
        .with(
            fmt::layer()
                .with_timer(LogTimer)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(path)
}

/// Single-project mode, usually running under a batch parent that adds its
/// own timestamps: warnings and errors on stderr, the rest on stdout.
pub fn init_child(verbose: bool) {
    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(
            fmt::layer()
                .without_time()
                .with_ansi(false)
                .with_level(false)
                .with_target(false)
                .with_writer(
                    std::io::stderr
                        .with_max_level(Level::WARN)
                        .or_else(std::io::stdout),
                ),
        )
        .init();
}
