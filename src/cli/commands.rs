//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: supervise one session (default)
//! - status: inspect persisted failure counters

use clap::{Args, Parser, Subcommand};
use helmsman::config::ConfigOverrides;
use std::path::PathBuf;

/// Helmsman - restart a failing workload with bounded retries
#[derive(Parser, Debug)]
#[command(name = "helmsman")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one supervised session
    Run(RunArgs),

    /// Show persisted failure counts
    Status {
        /// Only show this session
        #[arg(short, long)]
        session: Option<u64>,

        /// Counter directory (overrides config)
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },
}

/// Options for a supervised run
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Failed attempts tolerated before escalation
    #[arg(short, long)]
    pub retry_ceiling: Option<u32>,

    /// Counter directory
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Process log file
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Kill and fail an attempt after this many milliseconds
    #[arg(long)]
    pub attempt_timeout_ms: Option<u64>,

    /// Program and arguments to supervise instead of the configured steps
    #[arg(last = true)]
    pub command: Vec<String>,
}

impl RunArgs {
    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            storage_dir: self.storage_dir,
            log_path: self.log_path,
            retry_ceiling: self.retry_ceiling,
            attempt_timeout_ms: self.attempt_timeout_ms,
            command: if self.command.is_empty() { None } else { Some(self.command) },
        }
    }
}
