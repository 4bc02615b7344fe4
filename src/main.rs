use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

use helmsman::config::{Config, ConfigOverrides};
use helmsman::counter::CounterStore;
use helmsman::supervisor::{ShutdownSignal, Supervisor};

mod cli;

use cli::Cli;
use cli::commands::{Commands, RunArgs};

/// Exit status for any fatal error, at startup or mid-session.
const EXIT_FATAL: i32 = 2;

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("helmsman")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("helmsman.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn handle_run_command(args: RunArgs, mut config: Config, verbose: bool) -> Result<i32> {
    let env_overrides = ConfigOverrides::from_env().context("Invalid environment override")?;
    args.into_overrides().or(env_overrides).apply(&mut config);

    if verbose {
        println!(
            "{} {} (retry ceiling {}, counters in {})",
            "Supervising:".cyan(),
            config
                .workload
                .steps
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" && "),
            config.supervisor.retry_ceiling,
            config.storage.dir.display()
        );
    }

    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_ctrl_c();

    let supervisor = Supervisor::from_config(&config)
        .context("Failed to build supervisor")?
        .with_shutdown(shutdown);

    match supervisor.run().await {
        Ok(report) => Ok(report.outcome.exit_code()),
        Err(e) => {
            eprintln!("{} {}", "Fatal:".red(), e);
            Ok(EXIT_FATAL)
        }
    }
}

/// Layer `--storage-dir` over the HELMSMAN_* environment, as `run` does.
fn status_config(mut config: Config, storage_dir: Option<PathBuf>, env_overrides: ConfigOverrides) -> Config {
    ConfigOverrides {
        storage_dir,
        ..Default::default()
    }
    .or(env_overrides)
    .apply(&mut config);
    config
}

fn handle_status_command(session: Option<u64>, storage_dir: Option<PathBuf>, config: Config) -> Result<i32> {
    let env_overrides = ConfigOverrides::from_env().context("Invalid environment override")?;
    let config = status_config(config, storage_dir, env_overrides);
    let dir = config.storage.dir.clone();
    let store = CounterStore::new(&dir, config.storage.prefix.clone());
    let ceiling = config.supervisor.retry_ceiling;

    let sessions = match session {
        Some(id) => vec![(id, store.read(id).context(format!("Failed to read session {}", id))?)],
        None => store.list_sessions().context("Failed to list sessions")?,
    };

    if sessions.is_empty() {
        println!("No sessions recorded in {}", dir.display());
        return Ok(0);
    }

    for (id, count) in sessions {
        let count_text = format!("{}/{}", count, ceiling);
        let colored_count = if count == 0 {
            count_text.green()
        } else if count < ceiling {
            count_text.yellow()
        } else {
            count_text.red()
        };
        println!("{} {:>6}  failures {}", "session".bold(), id, colored_count);
    }
    Ok(0)
}

async fn run(cli: Cli) -> Result<i32> {
    setup_logging().context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    let verbose = cli.is_verbose();
    match cli.command {
        None => handle_run_command(RunArgs::default(), config, verbose).await,
        Some(Commands::Run(args)) => handle_run_command(args, config, verbose).await,
        Some(Commands::Status { session, storage_dir }) => handle_status_command(session, storage_dir, config),
    }
}

/// Map the command result to the process exit status.
fn exit_code(result: Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Fatal:".red(), e);
            EXIT_FATAL
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = exit_code(run(cli).await);
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use helmsman::config::{ENV_RETRY_CEILING, ENV_STORAGE_DIR};

    fn env(vars: &[(&str, &str)]) -> ConfigOverrides {
        let vars: Vec<(String, String)> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ConfigOverrides::from_lookup(|key| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())).unwrap()
    }

    #[test]
    fn test_startup_error_is_fatal_exit() {
        let err = Config::load_from_file(&PathBuf::from("/nonexistent/helmsman.yml"))
            .context("Failed to load configuration")
            .map(|_| 0);
        assert_eq!(exit_code(err), EXIT_FATAL);
    }

    #[test]
    fn test_session_exit_codes_pass_through() {
        assert_eq!(exit_code(Ok(0)), 0);
        assert_eq!(exit_code(Ok(1)), 1);
        assert_eq!(exit_code(Ok(130)), 130);
    }

    #[test]
    fn test_status_uses_env_overrides() {
        let config = status_config(
            Config::default(),
            None,
            env(&[(ENV_STORAGE_DIR, "/srv/failures"), (ENV_RETRY_CEILING, "3")]),
        );
        assert_eq!(config.storage.dir, PathBuf::from("/srv/failures"));
        assert_eq!(config.supervisor.retry_ceiling, 3);
    }

    #[test]
    fn test_status_flag_wins_over_env() {
        let config = status_config(
            Config::default(),
            Some(PathBuf::from("cli-dir")),
            env(&[(ENV_STORAGE_DIR, "/srv/failures")]),
        );
        assert_eq!(config.storage.dir, PathBuf::from("cli-dir"));
    }
}
