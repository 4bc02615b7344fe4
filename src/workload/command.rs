//! Step-sequence workload backed by external processes.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Step, Workload, WorkloadResult};
use crate::config::WorkloadConfig;
use crate::error::{HelmError, Result};

/// Runs a fixed sequence of steps; the first failing step fails the attempt.
#[derive(Debug, Clone)]
pub struct CommandWorkload {
    steps: Vec<Step>,
    attempt_timeout: Option<Duration>,
    working_dir: Option<PathBuf>,
}

impl CommandWorkload {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            attempt_timeout: None,
            working_dir: None,
        }
    }

    pub fn from_config(config: &WorkloadConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            attempt_timeout: config.attempt_timeout_ms.map(Duration::from_millis),
            working_dir: config.working_dir.clone(),
        }
    }

    /// Bound each attempt. Without this an attempt may run forever.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    async fn run_command(&self, program: &str, args: &[String]) -> Result<WorkloadResult> {
        let mut cmd = Command::new(program);
        cmd.args(args).kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| HelmError::Execution(format!("failed to spawn '{}': {}", program, e)))?;

        let status = child
            .wait()
            .await
            .map_err(|e| HelmError::Execution(format!("failed to wait on '{}': {}", program, e)))?;

        if status.success() {
            Ok(WorkloadResult::Success)
        } else {
            log::info!("Step '{}' exited with {}", program, status);
            Ok(WorkloadResult::Failure)
        }
    }

    async fn run_step(&self, step: &Step) -> Result<WorkloadResult> {
        match step {
            Step::Command { program, args } => self.run_command(program, args).await,
            Step::Sleep { secs } => {
                tokio::time::sleep(Duration::from_secs(*secs)).await;
                Ok(WorkloadResult::Success)
            }
            Step::Echo { message } => {
                emit_marker(&mut std::io::stdout().lock(), message);
                Ok(WorkloadResult::Success)
            }
        }
    }

    async fn run_steps(&self) -> Result<WorkloadResult> {
        for step in &self.steps {
            log::debug!("Running step: {}", step);
            if self.run_step(step).await? == WorkloadResult::Failure {
                return Ok(WorkloadResult::Failure);
            }
        }
        Ok(WorkloadResult::Success)
    }
}

/// Print a marker line. A closed or broken stdout must not end the attempt.
fn emit_marker(out: &mut impl Write, message: &str) {
    if let Err(e) = writeln!(out, "{}", message).and_then(|_| out.flush()) {
        log::debug!("Dropped marker '{}': {}", message, e);
    }
}

#[async_trait]
impl Workload for CommandWorkload {
    async fn run_once(&self) -> Result<WorkloadResult> {
        match self.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run_steps()).await {
                Ok(result) => result,
                Err(_) => {
                    log::warn!("Attempt timed out after {}ms", limit.as_millis());
                    Ok(WorkloadResult::Failure)
                }
            },
            None => self.run_steps().await,
        }
    }
}
