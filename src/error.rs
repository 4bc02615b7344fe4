//! Error types for Helmsman
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur while supervising a workload
#[derive(Debug, Error)]
pub enum HelmError {
    /// Counter store unreadable or unwritable
    #[error("Storage error: {0}")]
    Storage(String),

    /// Appending to the process log failed
    #[error("Log sink error: {0}")]
    LogSink(String),

    /// A workload step could not be launched at all
    #[error("Execution error: {0}")]
    Execution(String),

    /// Escalation delivery failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl HelmError {
    /// Whether this error must abort the supervisor session.
    ///
    /// Notification failures are logged and swallowed; everything else stops the loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HelmError::Notification(_))
    }
}

/// Result type alias for Helmsman operations
pub type Result<T> = std::result::Result<T, HelmError>;
