//! Event logging handed to the settings store and commands.
//!
//! Library code never logs user-facing events through a global function; a
//! [`Logger`] is passed in by whoever drives the store. Two implementations
//! exist:
//!
//! - [`TracingLogger`] forwards events to `tracing`
//! - [`FileLogger`] appends timestamped lines to a file (and forwards to `tracing`)
//!
//! The file format is one event per line:
//! ```text
//! 2026-01-31T12:00:00Z [INFO] Loaded /home/me/.factorio/mods/mod-settings.dat (version 1.1.100.0)
//! 2026-01-31T12:00:00Z [WARN] Ignoring trailing bytes
//! ```

use chrono::{SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Log levels for settings events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A sink for user-facing events.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Forwards events to the process-wide `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
    }
}

/// Appends events to a log file.
///
/// Writing never fails the caller: errors are reported on stderr for
/// error-level events only and otherwise dropped.
#[derive(Debug, Clone)]
pub struct FileLogger {
    path: PathBuf,
}

impl FileLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, level: LogLevel, message: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        writeln!(file, "{}", format_log_line(&timestamp, level, message))
    }
}

impl Logger for FileLogger {
    fn log(&self, level: LogLevel, message: &str) {
        TracingLogger.log(level, message);
        if let Err(e) = self.append(level, message) {
            if level == LogLevel::Error {
                eprintln!("Warning: Failed to write log file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Format one log line.
pub fn format_log_line(timestamp: &str, level: LogLevel, message: &str) -> String {
    format!("{} [{}] {}", timestamp, level, message)
}
