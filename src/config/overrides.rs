//! Runtime overrides applied on top of file configuration.
//!
//! Sources, lowest to highest precedence: HELMSMAN_* environment variables, then CLI flags.

use std::path::PathBuf;

use super::Config;
use crate::error::{HelmError, Result};
use crate::workload::Step;

/// Environment variable overriding `storage.dir`.
pub const ENV_STORAGE_DIR: &str = "HELMSMAN_STORAGE_DIR";

/// Environment variable overriding `log.path`.
pub const ENV_LOG_PATH: &str = "HELMSMAN_LOG_PATH";

/// Environment variable overriding `supervisor.retry-ceiling`.
pub const ENV_RETRY_CEILING: &str = "HELMSMAN_RETRY_CEILING";

/// Overrides for a single supervisor run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub storage_dir: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub retry_ceiling: Option<u32>,
    pub attempt_timeout_ms: Option<u64>,

    /// Program and arguments replacing the configured step sequence.
    pub command: Option<Vec<String>>,
}

impl ConfigOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let retry_ceiling = match lookup(ENV_RETRY_CEILING) {
            Some(raw) => Some(raw.trim().parse::<u32>().map_err(|e| {
                HelmError::Config(format!("{} must be a non-negative integer, got '{}': {}", ENV_RETRY_CEILING, raw, e))
            })?),
            None => None,
        };

        Ok(Self {
            storage_dir: lookup(ENV_STORAGE_DIR).map(PathBuf::from),
            log_path: lookup(ENV_LOG_PATH).map(PathBuf::from),
            retry_ceiling,
            ..Default::default()
        })
    }

    /// Layer `self` over `lower`; fields set here win.
    pub fn or(self, lower: ConfigOverrides) -> Self {
        Self {
            storage_dir: self.storage_dir.or(lower.storage_dir),
            log_path: self.log_path.or(lower.log_path),
            retry_ceiling: self.retry_ceiling.or(lower.retry_ceiling),
            attempt_timeout_ms: self.attempt_timeout_ms.or(lower.attempt_timeout_ms),
            command: self.command.or(lower.command),
        }
    }

    /// Write every set field into `config`.
    pub fn apply(self, config: &mut Config) {
        if let Some(dir) = self.storage_dir {
            config.storage.dir = dir;
        }
        if let Some(path) = self.log_path {
            config.log.path = path;
        }
        if let Some(ceiling) = self.retry_ceiling {
            config.supervisor.retry_ceiling = ceiling;
        }
        if let Some(ms) = self.attempt_timeout_ms {
            config.workload.attempt_timeout_ms = Some(ms);
        }
        if let Some(command) = self.command {
            if let Some((program, args)) = command.split_first() {
                config.workload.steps = vec![Step::Command {
                    program: program.clone(),
                    args: args.to_vec(),
                }];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_overrides() {
        let from_env = ConfigOverrides::from_lookup(lookup(&[])).unwrap();
        assert_eq!(from_env, ConfigOverrides::default());

        let mut config = Config::default();
        from_env.apply(&mut config);
        assert_eq!(config.storage.dir, Config::default().storage.dir);
        assert_eq!(config.supervisor.retry_ceiling, Config::default().supervisor.retry_ceiling);
    }

    #[test]
    fn test_from_lookup() {
        let overrides = ConfigOverrides::from_lookup(lookup(&[
            (ENV_STORAGE_DIR, "/tmp/failures"),
            (ENV_LOG_PATH, "/tmp/process_log.txt"),
            (ENV_RETRY_CEILING, " 5 "),
        ]))
        .unwrap();

        assert_eq!(overrides.storage_dir, Some(PathBuf::from("/tmp/failures")));
        assert_eq!(overrides.log_path, Some(PathBuf::from("/tmp/process_log.txt")));
        assert_eq!(overrides.retry_ceiling, Some(5));
    }

    #[test]
    fn test_malformed_ceiling_is_config_error() {
        let err = ConfigOverrides::from_lookup(lookup(&[(ENV_RETRY_CEILING, "ten")])).unwrap_err();
        assert!(matches!(err, HelmError::Config(_)));
        assert!(err.to_string().contains(ENV_RETRY_CEILING));
    }

    #[test]
    fn test_cli_wins_over_env() {
        let env = ConfigOverrides {
            retry_ceiling: Some(5),
            storage_dir: Some(PathBuf::from("env-dir")),
            ..Default::default()
        };
        let cli = ConfigOverrides {
            retry_ceiling: Some(2),
            ..Default::default()
        };

        let merged = cli.or(env);
        assert_eq!(merged.retry_ceiling, Some(2));
        assert_eq!(merged.storage_dir, Some(PathBuf::from("env-dir")));
    }

    #[test]
    fn test_apply_command_replaces_steps() {
        let mut config = Config::default();
        let overrides = ConfigOverrides {
            command: Some(vec!["./worker".to_string(), "--once".to_string()]),
            retry_ceiling: Some(3),
            attempt_timeout_ms: Some(1500),
            ..Default::default()
        };

        overrides.apply(&mut config);

        assert_eq!(config.supervisor.retry_ceiling, 3);
        assert_eq!(config.workload.attempt_timeout_ms, Some(1500));
        assert_eq!(
            config.workload.steps,
            vec![Step::Command {
                program: "./worker".to_string(),
                args: vec!["--once".to_string()],
            }]
        );
    }

    #[test]
    fn test_apply_empty_command_keeps_steps() {
        let mut config = Config::default();
        let before = config.workload.steps.clone();
        ConfigOverrides {
            command: Some(Vec::new()),
            ..Default::default()
        }
        .apply(&mut config);
        assert_eq!(config.workload.steps, before);
    }
}
