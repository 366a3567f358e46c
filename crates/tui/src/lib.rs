mod app;
mod async_ops;
mod peek;
mod scroll;
mod theme;
mod ui;
mod views;

use anyhow::{Context, Result};
use app::{App, AppOptions};
use chrono::{Local, NaiveDate};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use shelltrail_core::filter::DisplayMode;
use shelltrail_core::period::Period;
use shelltrail_core::store::CommandStore;
use shelltrail_local_db::LocalDb;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use async_ops::CommandResult;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub db_path: PathBuf,
    pub period: Period,
    /// Initial date; today when unset.
    pub date: Option<NaiveDate>,
    pub display_mode: DisplayMode,
    pub tick_rate: Duration,
}

/// Launch the TUI against the history database at `options.db_path`.
pub fn run_with_options(options: RunOptions) -> Result<()> {
    let db = LocalDb::open_path(&options.db_path)
        .with_context(|| format!("open history at {}", options.db_path.display()))?;
    run_with_store(Arc::new(db), options)
}

/// Launch the TUI against any command store.
pub fn run_with_store(store: Arc<dyn CommandStore>, options: RunOptions) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let height = terminal.size()?.height;
    let mut app = App::new(AppOptions {
        today: Local::now().date_naive(),
        date: options.date,
        period: options.period,
        display_mode: options.display_mode,
        viewport_height: height,
    });
    tracing::info!(period = %options.period, "tui started");

    let result = event_loop(&mut terminal, &mut app, store, options.tick_rate);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    store: Arc<dyn CommandStore>,
    tick_rate: Duration,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let (tx, rx) = mpsc::channel::<CommandResult>();

    loop {
        // ── Deliver finished storage work ────────────────────────────
        while let Ok(result) = rx.try_recv() {
            app.apply_command_result(result);
        }

        // ── Dispatch newly queued storage work ───────────────────────
        for cmd in app.take_pending_commands() {
            let store = Arc::clone(&store);
            let tx = tx.clone();
            rt.spawn(async move {
                let result = async_ops::execute(cmd, store).await;
                // The receiver is gone once the loop exits.
                let _ = tx.send(result);
            });
        }

        app.refresh_today(Local::now().date_naive());
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if app.handle_key(key) {
                        break;
                    }
                }
                Event::Resize(_, height) => app.set_viewport_height(height),
                _ => {}
            }
        }
    }
    Ok(())
}
