//! Structured logging.
//!
//! A small level-filtered logger writing text or JSON lines to stderr.
//! The process installs a [`LogConfig`] once via [`init`]; until then every
//! call to [`log`] is a no-op, so libraries can emit events unconditionally
//! and leave the decision to the host.

use std::fmt;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Log severity, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Uppercase name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format for emitted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Logger configuration.
#[derive(Debug, Clone, Copy)]
pub struct LogConfig {
    /// Minimum level that gets emitted.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
        }
    }
}

/// A single log event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry<'a> {
    /// Severity of the event.
    pub level: LogLevel,
    /// Module or subsystem that produced the event.
    pub target: &'a str,
    /// Event text.
    pub message: &'a str,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

static CONFIG: OnceLock<LogConfig> = OnceLock::new();

/// Install the process-wide logger configuration.
///
/// Returns `false` if a configuration was already installed; the first
/// installation wins.
pub fn init(config: LogConfig) -> bool {
    CONFIG.set(config).is_ok()
}

/// Whether an event at `level` would be emitted.
///
/// Use this to skip formatting work for disabled levels.
#[must_use]
pub fn enabled(level: LogLevel) -> bool {
    CONFIG.get().is_some_and(|config| level >= config.level)
}

/// Emit a log event.
///
/// No-op unless [`init`] was called and `level` clears the configured
/// threshold.
pub fn log(level: LogLevel, target: &str, message: &str) {
    let Some(config) = CONFIG.get() else {
        return;
    };
    if level < config.level {
        return;
    }

    let entry = LogEntry {
        level,
        target,
        message,
        timestamp_ms: now_ms(),
    };
    match config.format {
        LogFormat::Text => {
            eprintln!(
                "{} {:5} {}: {}",
                entry.timestamp_ms, entry.level, entry.target, entry.message
            );
        }
        LogFormat::Json => {
            if let Ok(line) = serde_json::to_string(&entry) {
                eprintln!("{line}");
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
