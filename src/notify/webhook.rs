//! Mail-API notifier.
//!
//! Posts a SendGrid-style `mail/send` payload with a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::Notifier;
use crate::config::NotifyConfig;
use crate::counter::SessionId;
use crate::error::{HelmError, Result};

pub struct WebhookNotifier {
    client: Client,
    url: String,
    api_key: String,
    to: String,
    from: String,
    subject_prefix: String,
}

impl WebhookNotifier {
    /// Build from configuration, reading the token from `api-key-env`.
    pub fn from_config(config: &NotifyConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| HelmError::Config(format!("{} not set", config.api_key_env)))?;
        let to = config
            .to
            .clone()
            .ok_or_else(|| HelmError::Config("notify.to is required for webhook notifications".to_string()))?;
        let from = config.from.clone().unwrap_or_else(|| to.clone());

        Self::new(
            &config.url,
            api_key,
            to,
            from,
            &config.subject_prefix,
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        to: impl Into<String>,
        from: impl Into<String>,
        subject_prefix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HelmError::Notification(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            to: to.into(),
            from: from.into(),
            subject_prefix: subject_prefix.into(),
        })
    }

    fn build_payload(&self, session_id: SessionId, failure_count: u32) -> Value {
        let subject = format!(
            "{} -- Process failed {} times (session {})",
            self.subject_prefix, failure_count, session_id
        );
        let body = format!(
            "{}. Failure occurred at {}",
            subject,
            chrono::Local::now().format("%a %b %d %Y %H:%M:%S")
        );

        json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }]
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, session_id: SessionId, failure_count: u32) -> Result<()> {
        let payload = self.build_payload(session_id, failure_count);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| HelmError::Notification(format!("request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(HelmError::Notification(format!("{} returned {}: {}", self.url, status, text)));
        }

        log::info!("Escalation sent for session {} ({})", session_id, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_notifier(url: &str) -> WebhookNotifier {
        WebhookNotifier::new(
            url,
            "key",
            "ops@example.com",
            "helmsman@example.com",
            "Helmsman",
            Duration::from_millis(500),
        )
        .unwrap()
    }

    #[test]
    fn test_payload_shape() {
        let notifier = test_notifier("http://localhost");
        let payload = notifier.build_payload(7, 10);

        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "ops@example.com");
        assert_eq!(payload["from"]["email"], "helmsman@example.com");
        assert_eq!(payload["subject"], "Helmsman -- Process failed 10 times (session 7)");
        assert_eq!(payload["content"][0]["type"], "text/plain");
        assert!(
            payload["content"][0]["value"]
                .as_str()
                .unwrap()
                .starts_with("Helmsman -- Process failed 10 times")
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_notification_error() {
        let notifier = test_notifier("http://127.0.0.1:1/mail/send");
        let err = notifier.send(1, 10).await.unwrap_err();
        assert!(matches!(err, HelmError::Notification(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_from_config_requires_api_key_env() {
        let config = NotifyConfig {
            api_key_env: "HELMSMAN_TEST_UNSET_KEY_VAR".to_string(),
            to: Some("ops@example.com".to_string()),
            ..Default::default()
        };
        let err = WebhookNotifier::from_config(&config).err().unwrap();
        assert!(matches!(err, HelmError::Config(_)));
    }
}
