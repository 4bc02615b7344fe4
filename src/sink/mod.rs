//! Process log sink.
//!
//! Operator-facing record of the supervisor: timestamped lines appended to a
//! durable file and mirrored to the console.

mod file;

pub use file::FileLogSink;

use std::fmt;

use chrono::{DateTime, Local};

use crate::error::Result;

/// Immutable timestamped log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    /// Stamp `message` with the current wall-clock time.
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    /// Render as `"{timestamp}: {message}\n"`.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S%.6f"), self.message)
    }
}

/// Destination for supervisor log lines.
///
/// Every call is a complete append; errors propagate so the caller decides
/// whether a lost line is fatal.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str) -> Result<()>;
}
