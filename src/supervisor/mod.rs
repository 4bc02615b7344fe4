//! Supervisor loop.
//!
//! Drives one session through `Init -> Running -> {Succeeded, Retrying, Exhausted}`:
//! run the workload, count and persist each failure, restart until success or
//! the retry ceiling, then escalate.

mod runner;
mod shutdown;
mod state;

pub use runner::{
    MSG_INCREMENTING, MSG_RESTARTING, MSG_STARTING, Supervisor, escalation_message, increment_message,
};
pub use shutdown::ShutdownSignal;
pub use state::{RunSession, SessionOutcome, SessionReport, SupervisorState};
