mod config_cmd;
mod summary_cmd;
mod tui_cmd;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use shelltrail_core::period::Period;
use shelltrail_runtime_config::{LOG_FILE_NAME, ShelltrailConfig, data_dir};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "shelltrail",
    version,
    about = "Browse shell command history by directory, repository and period",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    browse: PeriodArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive history browser (default)
    Tui(PeriodArgs),

    /// Print the per-context summary of one period
    Summary(summary_cmd::SummaryArgs),

    /// Show the resolved configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Options shared by every command that looks at one period.
#[derive(Args, Debug, Clone, Default)]
pub struct PeriodArgs {
    /// History database (defaults to the configured path)
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Period length: day, week or month
    #[arg(long)]
    pub period: Option<Period>,

    /// A date inside the period to show (YYYY-MM-DD, defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,
}

impl PeriodArgs {
    pub fn db_path(&self, config: &ShelltrailConfig) -> Result<PathBuf> {
        match &self.db {
            Some(path) => Ok(path.clone()),
            None => config.db_path(),
        }
    }

    pub fn period(&self, config: &ShelltrailConfig) -> Period {
        self.period.unwrap_or(config.ui.default_period)
    }
}

fn main() {
    let cli = Cli::parse();
    let config = ShelltrailConfig::load();

    let result = match cli.command {
        Some(Commands::Summary(args)) => {
            init_tracing(None).and_then(|()| summary_cmd::run_summary(&args, &config))
        }
        Some(Commands::Config { init }) => {
            init_tracing(None).and_then(|()| config_cmd::run_config(&config, init))
        }
        Some(Commands::Tui(args)) => run_tui(&args, &config),
        None => run_tui(&cli.browse, &config),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_tui(args: &PeriodArgs, config: &ShelltrailConfig) -> Result<()> {
    // The terminal belongs to the UI, so logs go to a file.
    let log_path = data_dir()?.join(LOG_FILE_NAME);
    init_tracing(Some(&log_path))?;
    tui_cmd::run_tui(args, config)
}

/// Install the global subscriber, writing to `log_file` or stderr.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());
    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create dir for {}", path.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
