//! Helmsman - a bounded-retry process supervisor
//!
//! Launches a workload, counts failed attempts in a per-session counter file
//! that external monitors can read, restarts up to a retry ceiling and then
//! escalates to a notifier.

pub mod config;
pub mod counter;
pub mod error;
pub mod notify;
pub mod sink;
pub mod supervisor;
pub mod workload;

pub use error::{HelmError, Result};
