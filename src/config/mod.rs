//! Configuration system for Helmsman.
//!
//! Layered configuration:
//! 1. File config (explicit path, ./helmsman.yml or ~/.config/helmsman/helmsman.yml)
//! 2. Environment overrides (HELMSMAN_*)
//! 3. Command-line overrides

pub use self::global::{Config, LogConfig, NotifyConfig, NotifyKind, StorageConfig, SupervisorConfig, WorkloadConfig};
pub use self::overrides::{ConfigOverrides, ENV_LOG_PATH, ENV_RETRY_CEILING, ENV_STORAGE_DIR};

mod global;
mod overrides;

/// Default directory for counter artifacts.
pub const DEFAULT_STORAGE_DIR: &str = "./failures";

/// Default counter artifact prefix.
pub const DEFAULT_COUNTER_PREFIX: &str = "fail_file_";

/// Default process log file name, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "process_log.txt";

/// Default number of failed attempts tolerated before escalation.
pub const DEFAULT_RETRY_CEILING: u32 = 10;
