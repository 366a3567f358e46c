use anyhow::Result;
use shelltrail_runtime_config::ShelltrailConfig;
use shelltrail_tui::RunOptions;
use std::time::Duration;

use crate::PeriodArgs;

/// Shortest accepted input poll interval.
const MIN_TICK_RATE_MS: u64 = 10;

pub fn run_tui(args: &PeriodArgs, config: &ShelltrailConfig) -> Result<()> {
    let options = run_options(args, config)?;
    tracing::info!(db = %options.db_path.display(), "opening history browser");
    shelltrail_tui::run_with_options(options)
}

fn run_options(args: &PeriodArgs, config: &ShelltrailConfig) -> Result<RunOptions> {
    Ok(RunOptions {
        db_path: args.db_path(config)?,
        period: args.period(config),
        date: args.date,
        display_mode: config.ui.default_display_mode,
        tick_rate: Duration::from_millis(config.ui.tick_rate_ms.max(MIN_TICK_RATE_MS)),
    })
}
