//! Escalation when the retry ceiling is reached.

mod webhook;

pub use webhook::WebhookNotifier;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{NotifyConfig, NotifyKind};
use crate::counter::SessionId;
use crate::error::Result;

/// Receives exactly one call per exhausted session.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, session_id: SessionId, failure_count: u32) -> Result<()>;
}

/// Records the escalation in the diagnostic log only.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, session_id: SessionId, failure_count: u32) -> Result<()> {
        log::error!(
            "Escalation: session {} exhausted its retries after {} failures",
            session_id,
            failure_count
        );
        Ok(())
    }
}

/// Build the notifier selected by configuration.
pub fn from_config(config: &NotifyConfig) -> Result<Arc<dyn Notifier>> {
    match config.kind {
        NotifyKind::Log => Ok(Arc::new(LogNotifier)),
        NotifyKind::Webhook => Ok(Arc::new(WebhookNotifier::from_config(config)?)),
    }
}
