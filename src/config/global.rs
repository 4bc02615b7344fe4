//! File configuration.
//!
//! Loaded from an explicit path, ./helmsman.yml or ~/.config/helmsman/helmsman.yml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{DEFAULT_COUNTER_PREFIX, DEFAULT_LOG_FILE, DEFAULT_RETRY_CEILING, DEFAULT_STORAGE_DIR};
use crate::error::{HelmError, Result};
use crate::workload::Step;

/// Top-level configuration for a supervisor run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Counter artifact storage.
    pub storage: StorageConfig,

    /// Process log sink.
    pub log: LogConfig,

    /// Retry policy.
    pub supervisor: SupervisorConfig,

    /// Supervised workload.
    pub workload: WorkloadConfig,

    /// Escalation target.
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. helmsman.yml in current directory
    /// 3. ~/.config/helmsman/helmsman.yml
    /// 4. Defaults
    ///
    /// The first file that exists is authoritative: if it fails to parse, loading fails.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let project_name = env!("CARGO_PKG_NAME");

        let mut candidates = vec![PathBuf::from(format!("{}.yml", project_name))];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
        }

        Self::load_first_existing(&candidates)
    }

    fn load_first_existing(candidates: &[PathBuf]) -> Result<Self> {
        match candidates.iter().find(|path| path.exists()) {
            Some(path) => Self::load_from_file(path),
            None => {
                log::info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and parse a single YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| HelmError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_yaml::from_str(&content)?;
        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.supervisor.retry_ceiling == 0 {
            return Err(HelmError::Config("supervisor.retry-ceiling must be > 0".to_string()));
        }
        if self.workload.steps.is_empty() {
            return Err(HelmError::Config("workload.steps must not be empty".to_string()));
        }
        if self.storage.prefix.is_empty() {
            return Err(HelmError::Config("storage.prefix must not be empty".to_string()));
        }
        if self.notify.kind == NotifyKind::Webhook && self.notify.to.is_none() {
            return Err(HelmError::Config("notify.to is required for webhook notifications".to_string()));
        }
        Ok(())
    }
}

/// Counter artifact storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one counter artifact per session.
    pub dir: PathBuf,

    /// Fixed file name prefix preceding the session ordinal.
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            prefix: DEFAULT_COUNTER_PREFIX.to_string(),
        }
    }
}

/// Process log settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Append-only log file.
    pub path: PathBuf,

    /// Mirror every line to stdout.
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            path: cwd.join(DEFAULT_LOG_FILE),
            console: true,
        }
    }
}

/// Retry policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Failed attempts tolerated before escalation.
    #[serde(rename = "retry-ceiling")]
    pub retry_ceiling: u32,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            retry_ceiling: DEFAULT_RETRY_CEILING,
        }
    }
}

/// Supervised workload definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Steps executed in order on every attempt.
    pub steps: Vec<Step>,

    /// Optional limit per attempt. None waits indefinitely.
    #[serde(rename = "attempt-timeout-ms", skip_serializing_if = "Option::is_none")]
    pub attempt_timeout_ms: Option<u64>,

    /// Working directory for command steps.
    #[serde(rename = "working-dir", skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            steps: Step::reference_sequence(),
            attempt_timeout_ms: None,
            working_dir: None,
        }
    }
}

/// Notification transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    /// Record the escalation in the diagnostic log only
    #[default]
    Log,
    /// POST a mail payload to an HTTP endpoint
    Webhook,
}

/// Escalation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub kind: NotifyKind,

    /// Mail API endpoint.
    pub url: String,

    /// Environment variable holding the bearer token.
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Recipient address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Sender address. Defaults to the recipient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(rename = "subject-prefix")]
    pub subject_prefix: String,

    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            kind: NotifyKind::Log,
            url: "https://api.sendgrid.com/v3/mail/send".to_string(),
            api_key_env: "SENDGRID_API_KEY".to_string(),
            to: None,
            from: None,
            subject_prefix: "Helmsman".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.supervisor.retry_ceiling, 10);
        assert_eq!(config.storage.dir, PathBuf::from("./failures"));
        assert_eq!(config.storage.prefix, "fail_file_");
        assert!(config.log.path.ends_with("process_log.txt"));
        assert!(config.workload.attempt_timeout_ms.is_none());
        assert_eq!(config.notify.kind, NotifyKind::Log);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_retry_ceiling_rejected() {
        let config = Config {
            supervisor: SupervisorConfig { retry_ceiling: 0 },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry-ceiling"));
    }

    #[test]
    fn test_empty_steps_rejected() {
        let mut config = Config::default();
        config.workload.steps.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_webhook_requires_recipient() {
        let mut config = Config::default();
        config.notify.kind = NotifyKind::Webhook;
        assert!(config.validate().is_err());

        config.notify.to = Some("ops@example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
storage:
  dir: /var/lib/helmsman
supervisor:
  retry-ceiling: 3
workload:
  attempt-timeout-ms: 60000
  steps:
    - kind: command
      program: ./deploy.sh
      args: ["--prod"]
notify:
  kind: webhook
  to: ops@example.com
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage.dir, PathBuf::from("/var/lib/helmsman"));
        assert_eq!(config.storage.prefix, "fail_file_");
        assert_eq!(config.supervisor.retry_ceiling, 3);
        assert_eq!(config.workload.attempt_timeout_ms, Some(60000));
        assert_eq!(
            config.workload.steps,
            vec![Step::Command {
                program: "./deploy.sh".to_string(),
                args: vec!["--prod".to_string()],
            }]
        );
        assert_eq!(config.notify.kind, NotifyKind::Webhook);
        assert_eq!(config.notify.api_key_env, "SENDGRID_API_KEY");
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yml");
        fs::write(&path, "supervisor:\n  retry-ceiling: 4\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.supervisor.retry_ceiling, 4);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, HelmError::Config(_)));
    }

    #[test]
    fn test_invalid_fallback_file_fails() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("helmsman.yml");
        let valid = dir.path().join("user.yml");
        fs::write(&broken, "supervisor:\n  retry-ceiling: ten\n").unwrap();
        fs::write(&valid, "supervisor:\n  retry-ceiling: 4\n").unwrap();

        let err = Config::load_first_existing(&[broken, valid]).unwrap_err();
        assert!(matches!(err, HelmError::Yaml(_)));
    }

    #[test]
    fn test_fallback_skips_missing_files() {
        let dir = TempDir::new().unwrap();
        let valid = dir.path().join("user.yml");
        fs::write(&valid, "supervisor:\n  retry-ceiling: 4\n").unwrap();

        let config = Config::load_first_existing(&[dir.path().join("absent.yml"), valid]).unwrap();
        assert_eq!(config.supervisor.retry_ceiling, 4);
    }

    #[test]
    fn test_no_fallback_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_first_existing(&[dir.path().join("absent.yml")]).unwrap();
        assert_eq!(config.supervisor.retry_ceiling, 10);
    }
}
