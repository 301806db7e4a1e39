use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};

pub mod commands;

use self::commands::{FetchArgs, ListArgs};

const LOG_FILE: &str = "ratchaview.log";

#[derive(Parser, Debug)]
#[command(
    name = "ratchaview",
    version,
    about = "Terminal viewer for the Thai royal gazette index"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over RATCHAVIEW_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over RATCHAVIEW_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Print the gazette index, optionally filtered by title
    List(ListArgs),
    /// Download a record's document (and draft note) to disk
    Fetch(FetchArgs),
}

enum LogTarget {
    Stderr,
    File(PathBuf),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let command = cli.command.unwrap_or(Commands::Tui);
    // The TUI owns the terminal, so its logs go to a file.
    let target = match command {
        Commands::Tui => LogTarget::File(loader.paths().log_dir.join(LOG_FILE)),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = Arc::new(loader.load_or_init()?);
    tracing::debug!(config_file = %loader.paths().config_file.display(), "configuration loaded");

    match command {
        Commands::Tui => commands::run_tui(config),
        Commands::List(args) => commands::list_records(config, args),
        Commands::Fetch(args) => commands::fetch_record(config, args),
    }
}

fn init_tracing(level: &str, target: LogTarget) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match target {
            LogTarget::Stderr => fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init(),
            LogTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands_and_globals() {
        let cli = Cli::parse_from([
            "ratchaview",
            "--log-level",
            "debug",
            "list",
            "รัฐสภา",
            "--limit",
            "5",
        ]);
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Some(Commands::List(args)) => {
                assert_eq!(args.query.as_deref(), Some("รัฐสภา"));
                assert_eq!(args.limit, Some(5));
            }
            other => panic!("expected list command, got {other:?}"),
        }

        let cli = Cli::parse_from(["ratchaview"]);
        assert!(cli.command.is_none());
    }
}
