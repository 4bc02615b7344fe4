//! Session data and state-machine types.

use std::fmt;

use crate::counter::SessionId;

/// Supervisor state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Allocating the session and its counter
    Init,
    /// Waiting on a workload attempt
    Running,
    /// Recording a failed attempt
    Retrying,
    Succeeded,
    /// Retry ceiling reached; escalation pending
    Exhausted,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupervisorState::Init => "init",
            SupervisorState::Running => "running",
            SupervisorState::Retrying => "retrying",
            SupervisorState::Succeeded => "succeeded",
            SupervisorState::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// One supervisor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSession {
    /// Zero until `Init` allocates the ordinal
    pub session_id: SessionId,
    pub failure_count: u32,
    pub retry_ceiling: u32,
}

impl RunSession {
    pub fn new(retry_ceiling: u32) -> Self {
        Self {
            session_id: 0,
            failure_count: 0,
            retry_ceiling,
        }
    }

    /// Whether another attempt is allowed after the failures so far.
    pub fn can_retry(&self) -> bool {
        self.failure_count < self.retry_ceiling
    }
}

/// How a session ended without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Succeeded,
    Exhausted,
    /// Shutdown requested before an attempt
    Cancelled,
}

impl SessionOutcome {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionOutcome::Succeeded => 0,
            SessionOutcome::Exhausted => 1,
            SessionOutcome::Cancelled => 130,
        }
    }
}

/// Final session state returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub session: RunSession,
    pub outcome: SessionOutcome,
}

impl SessionReport {
    /// The single closing line written to the process log.
    pub fn summary(&self) -> String {
        let s = &self.session;
        match self.outcome {
            SessionOutcome::Succeeded => format!(
                "Session {} succeeded after {} failures",
                s.session_id, s.failure_count
            ),
            SessionOutcome::Exhausted => format!(
                "Session {} exhausted after {} failures, giving up",
                s.session_id, s.failure_count
            ),
            SessionOutcome::Cancelled => format!(
                "Session {} cancelled by shutdown request after {} failures",
                s.session_id, s.failure_count
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_retry_boundary() {
        let mut session = RunSession::new(10);
        session.failure_count = 9;
        assert!(session.can_retry());
        session.failure_count = 10;
        assert!(!session.can_retry());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(SessionOutcome::Succeeded.exit_code(), 0);
        assert_eq!(SessionOutcome::Exhausted.exit_code(), 1);
        assert_eq!(SessionOutcome::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_summary() {
        let report = SessionReport {
            session: RunSession {
                session_id: 4,
                failure_count: 10,
                retry_ceiling: 10,
            },
            outcome: SessionOutcome::Exhausted,
        };
        assert_eq!(report.summary(), "Session 4 exhausted after 10 failures, giving up");
    }
}
