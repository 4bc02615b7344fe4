//! Workload runner.
//!
//! The supervised unit of work. The supervisor only sees [`WorkloadResult`];
//! anything implementing [`Workload`] can be plugged in.

mod command;

pub use command::CommandWorkload;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadResult {
    Success,
    /// Expected, retryable failure (non-zero exit, timeout)
    Failure,
}

/// One execution of the supervised work.
///
/// Return `Ok(Failure)` for workload misbehavior and `Err(HelmError::Execution)`
/// when the environment prevents running it at all.
#[async_trait]
pub trait Workload: Send + Sync {
    async fn run_once(&self) -> Result<WorkloadResult>;
}

/// A single step of a command sequence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Step {
    /// Run an external program directly (no shell)
    Command {
        program: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
    },
    /// Pause in-process
    Sleep { secs: u64 },
    /// Print a marker line to stdout
    Echo { message: String },
}

impl Step {
    pub fn command(program: impl Into<String>, args: &[&str]) -> Self {
        Step::Command {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Placeholder workload: wait, print a marker, then fail.
    pub fn reference_sequence() -> Vec<Step> {
        vec![
            Step::command("sleep", &["5"]),
            Step::Echo {
                message: "Test".to_string(),
            },
            Step::command("false", &[]),
        ]
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Command { program, args } if args.is_empty() => write!(f, "{}", program),
            Step::Command { program, args } => write!(f, "{} {}", program, args.join(" ")),
            Step::Sleep { secs } => write!(f, "sleep {}s", secs),
            Step::Echo { message } => write!(f, "echo {:?}", message),
        }
    }
}
