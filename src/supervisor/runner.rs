//! Supervisor implementation - bounded-retry restart loop.
//!
//! Every failed attempt is persisted to the counter store before the restart
//! is logged, so an external reader never sees a count lower than the
//! number of "incrementing failure count" lines.

use std::sync::Arc;

use crate::config::Config;
use crate::counter::CounterStore;
use crate::error::Result;
use crate::notify::{self, Notifier};
use crate::sink::{FileLogSink, LogSink};
use crate::workload::{CommandWorkload, Workload, WorkloadResult};

use super::shutdown::ShutdownSignal;
use super::state::{RunSession, SessionOutcome, SessionReport, SupervisorState};

/// Logged once when a session starts.
pub const MSG_STARTING: &str = "Starting the process...";

/// Logged after every failed attempt, including the last one.
pub const MSG_RESTARTING: &str = "Restarting the process...";

/// Common stem of the per-failure line.
pub const MSG_INCREMENTING: &str = "Process ended with failure, incrementing failure count to";

pub fn increment_message(count: u32) -> String {
    format!("{} {}...", MSG_INCREMENTING, count)
}

pub fn escalation_message(count: u32) -> String {
    format!("Process has failed {} times, sending notification...", count)
}

/// Runs one workload session against a counter store and log sink.
pub struct Supervisor {
    store: CounterStore,
    sink: Arc<dyn LogSink>,
    workload: Arc<dyn Workload>,
    notifier: Arc<dyn Notifier>,
    retry_ceiling: u32,
    shutdown: ShutdownSignal,
}

impl Supervisor {
    /// Create a supervisor with the default retry ceiling.
    pub fn new(
        store: CounterStore,
        sink: Arc<dyn LogSink>,
        workload: Arc<dyn Workload>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            sink,
            workload,
            notifier,
            retry_ceiling: crate::config::DEFAULT_RETRY_CEILING,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Wire every collaborator from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let store = CounterStore::new(&config.storage.dir, config.storage.prefix.clone());
        let sink = FileLogSink::new(&config.log.path).with_console(config.log.console);
        let workload = CommandWorkload::from_config(&config.workload);
        let notifier = notify::from_config(&config.notify)?;

        Ok(Self::new(store, Arc::new(sink), Arc::new(workload), notifier)
            .with_retry_ceiling(config.supervisor.retry_ceiling))
    }

    pub fn with_retry_ceiling(mut self, retry_ceiling: u32) -> Self {
        self.retry_ceiling = retry_ceiling;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run one session to a terminal state.
    ///
    /// Storage, log and execution failures abort the session and are returned
    /// after a best-effort closing log line.
    pub async fn run(&self) -> Result<SessionReport> {
        let mut session = RunSession::new(self.retry_ceiling);

        match self.drive(&mut session).await {
            Ok(outcome) => {
                let report = SessionReport { session, outcome };
                self.sink.log(&report.summary())?;
                log::info!("{}", report.summary());
                Ok(report)
            }
            Err(e) => {
                // Ordinal 0 is never allocated, so no counter artifact exists yet.
                let line = if session.session_id == 0 {
                    format!("Supervisor aborted before session allocation: {}", e)
                } else {
                    format!("Session {} aborted: {}", session.session_id, e)
                };
                if let Err(log_err) = self.sink.log(&line) {
                    log::error!("Failed to record abort: {}", log_err);
                }
                log::error!("{}", line);
                Err(e)
            }
        }
    }

    async fn drive(&self, session: &mut RunSession) -> Result<SessionOutcome> {
        let mut state = SupervisorState::Init;

        loop {
            let next = match state {
                SupervisorState::Init => {
                    session.session_id = self.store.allocate_session()?;
                    self.store.initialize(session.session_id)?;
                    self.sink.log(MSG_STARTING)?;
                    SupervisorState::Running
                }
                SupervisorState::Running => {
                    if self.shutdown.is_requested() {
                        return Ok(SessionOutcome::Cancelled);
                    }
                    match self.workload.run_once().await? {
                        WorkloadResult::Success => SupervisorState::Succeeded,
                        WorkloadResult::Failure => SupervisorState::Retrying,
                    }
                }
                SupervisorState::Retrying => {
                    session.failure_count += 1;
                    self.store.update(session.session_id, session.failure_count)?;
                    self.sink.log(&increment_message(session.failure_count))?;
                    self.sink.log(MSG_RESTARTING)?;
                    if session.can_retry() {
                        SupervisorState::Running
                    } else {
                        SupervisorState::Exhausted
                    }
                }
                SupervisorState::Succeeded => return Ok(SessionOutcome::Succeeded),
                SupervisorState::Exhausted => {
                    self.escalate(session).await?;
                    return Ok(SessionOutcome::Exhausted);
                }
            };

            log::debug!("Session {}: {} -> {}", session.session_id, state, next);
            state = next;
        }
    }

    /// Notify once; a delivery failure is logged, never fatal.
    async fn escalate(&self, session: &RunSession) -> Result<()> {
        self.sink.log(&escalation_message(session.failure_count))?;

        if let Err(e) = self.notifier.send(session.session_id, session.failure_count).await {
            log::warn!("Escalation for session {} failed: {}", session.session_id, e);
            self.sink.log(&format!("Notification failed: {}", e))?;
        }
        Ok(())
    }
}
