use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::error::Result;

/// Handle for the run's logging. Created once at startup; the log file stays
/// open for as long as the global subscriber lives.
#[derive(Debug)]
pub struct LogSession {
    log_file: PathBuf,
}

impl LogSession {
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

fn console_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    }
}

fn file_filter() -> EnvFilter {
    EnvFilter::new(format!("info,{}=debug", env!("CARGO_CRATE_NAME")))
}

/// Opens `<log_dir>/migration_<timestamp>.log` in append mode.
pub fn open_log_file(log_dir: &Path) -> Result<(PathBuf, File)> {
    fs::create_dir_all(log_dir)?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = log_dir.join(format!("migration_{}.log", timestamp));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    Ok((path, file))
}

/// Installs the global subscriber: console output at info (debug when verbose)
/// and a plain-text file capturing debug output of this crate.
pub fn setup_tracing(verbose: bool, log_dir: &Path) -> Result<LogSession> {
    let (log_file, file) = open_log_file(log_dir)?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(console_filter(verbose)))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(file_filter()),
        )
        .init();

    Ok(LogSession { log_file })
}
