use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, TimeZone};
use clap::Args;
use serde::Serialize;
use shelltrail_core::bucket::{bucket_by_in, bucket_label_in, ordered_buckets};
use shelltrail_core::filter::{DisplayMode, filter_commands};
use shelltrail_core::group::{context_commands, group_by_context, summarize_contexts};
use shelltrail_core::period::Period;
use shelltrail_core::store::CommandStore;
use shelltrail_local_db::LocalDb;
use shelltrail_runtime_config::ShelltrailConfig;

use crate::PeriodArgs;

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub period: PeriodArgs,

    /// Only count commands containing this text (case-sensitive)
    #[arg(long, default_value = "")]
    pub filter: String,

    /// Only count commands that occur once in their context
    #[arg(long)]
    pub unique: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// One period's activity, grouped by context.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub period: Period,
    pub label: String,
    pub start: i64,
    pub end: i64,
    pub filter: String,
    pub mode: DisplayMode,
    pub total_commands: usize,
    pub contexts: Vec<ContextReport>,
}

#[derive(Debug, Serialize)]
pub struct ContextReport {
    pub cwd: String,
    pub repo: Option<String>,
    pub total: usize,
    pub filtered: usize,
    pub last_activity: i64,
    pub branches: Vec<BranchCount>,
    pub buckets: Vec<BucketReport>,
}

#[derive(Debug, Serialize)]
pub struct BranchCount {
    pub branch: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct BucketReport {
    pub label: String,
    pub count: usize,
    pub top_command: Option<String>,
}

pub fn run_summary(args: &SummaryArgs, config: &ShelltrailConfig) -> Result<()> {
    let db_path = args.period.db_path(config)?;
    let db = LocalDb::open_path(&db_path)
        .with_context(|| format!("open history at {}", db_path.display()))?;

    let date = args
        .period
        .date
        .unwrap_or_else(|| Local::now().date_naive());
    let mode = if args.unique {
        DisplayMode::Unique
    } else {
        config.ui.default_display_mode
    };
    let report = build_report(
        &db,
        args.period.period(config),
        date,
        &args.filter,
        mode,
        &Local,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    Ok(())
}

/// Load the period containing `date` and summarize it per context.
pub fn build_report<Tz: TimeZone>(
    store: &dyn CommandStore,
    period: Period,
    date: NaiveDate,
    filter: &str,
    mode: DisplayMode,
    tz: &Tz,
) -> Result<SummaryReport>
where
    Tz::Offset: std::fmt::Display,
{
    let (start, end) = period.range(date, tz);
    let commands = store.commands_by_date_range(start, end, None)?;
    tracing::debug!(%period, %date, commands = commands.len(), "building summary");

    let grouped = group_by_context(&commands);
    let contexts = summarize_contexts(&grouped, filter, mode)
        .into_iter()
        .map(|row| {
            let visible = filter_commands(&context_commands(&grouped, &row.key), mode, filter);
            let buckets = ordered_buckets(bucket_by_in(&visible, period.granularity(), tz))
                .into_iter()
                .map(|bucket| BucketReport {
                    label: bucket_label_in(bucket.id, period.granularity(), tz),
                    count: bucket.len(),
                    top_command: bucket.top_command().map(|(text, _)| text.to_string()),
                })
                .collect();
            ContextReport {
                repo: row.key.has_repo().then(|| row.key.repo.clone()),
                cwd: row.key.cwd,
                total: row.total,
                filtered: row.filtered,
                last_activity: row.last_timestamp,
                branches: row
                    .branches
                    .into_iter()
                    .map(|(branch, count)| BranchCount {
                        branch: branch.as_str().to_string(),
                        count,
                    })
                    .collect(),
                buckets,
            }
        })
        .collect();

    Ok(SummaryReport {
        period,
        label: period.describe(date),
        start,
        end,
        filter: filter.to_string(),
        mode,
        total_commands: commands.len(),
        contexts,
    })
}

fn print_text(report: &SummaryReport) {
    println!(
        "{} ({}): {} commands in {} contexts",
        report.label,
        report.period,
        report.total_commands,
        report.contexts.len()
    );
    if !report.filter.is_empty() || report.mode != DisplayMode::All {
        println!("filter: {:?}  mode: {}", report.filter, report.mode.label());
    }
    println!("{}", "─".repeat(50));

    if report.contexts.is_empty() {
        println!("No commands in this period.");
        return;
    }

    for ctx in &report.contexts {
        let counts = if ctx.filtered == ctx.total {
            format!("{}", ctx.total)
        } else {
            format!("{}/{}", ctx.filtered, ctx.total)
        };
        match &ctx.repo {
            Some(repo) => {
                let branches: Vec<String> = ctx
                    .branches
                    .iter()
                    .map(|b| format!("{}({})", b.branch, b.count))
                    .collect();
                println!("{}  [{repo}: {}]  {counts}", ctx.cwd, branches.join(" "));
            }
            None => println!("{}  {counts}", ctx.cwd),
        }
        for bucket in &ctx.buckets {
            println!(
                "  {:<16} {:>4}  {}",
                bucket.label,
                bucket.count,
                bucket.top_command.as_deref().unwrap_or("")
            );
        }
        println!();
    }
}
