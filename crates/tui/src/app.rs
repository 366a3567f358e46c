use chrono::{Days, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use shelltrail_core::bucket::{Bucket, bucket_by, ordered_buckets};
use shelltrail_core::filter::{DisplayMode, filter_commands};
use shelltrail_core::group::{
    ContextSummary, GroupedCommands, context_commands, group_by_context, summarize_contexts,
};
use shelltrail_core::period::Period;
use shelltrail_core::window::{CommandWindow, window_budget};
use shelltrail_core::{Command, ContextKey};

use crate::async_ops::{AsyncCommand, CommandResult};
use crate::peek::{self, ContextHints, PeekRequest, PeekSlot, PeekState, PeriodPeek};
use crate::scroll;

/// Rows of the command detail view not available to the window list:
/// header bar (3), footer (1) and the target field block (8).
pub const COMMAND_DETAIL_OVERHEAD: u16 = 12;

/// Which screen the user is viewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Summary,
    ContextDetail,
    CommandDetail,
    Help,
}

/// Flash message severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Info,
    Error,
}

/// A loaded session window around one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDetail {
    /// Balanced window, oldest first, target included.
    pub commands: Vec<Command>,
    pub target_index: usize,
    previous_id: Option<i64>,
    next_id: Option<i64>,
}

impl CommandDetail {
    fn from_window(window: CommandWindow, budget: usize) -> Option<Self> {
        // Neighbours come from the unbalanced window so a tiny budget never
        // hides the adjacent command from Up/Down.
        let previous_id = window.previous().map(|c| c.id);
        let next_id = window.next().map(|c| c.id);
        let balanced = window.balanced(budget);
        let (ordered, target_index) = balanced.ordered();
        let target_index = target_index?;
        let commands = ordered.into_iter().cloned().collect();
        Some(Self {
            commands,
            target_index,
            previous_id,
            next_id,
        })
    }

    pub fn target(&self) -> Option<&Command> {
        self.commands.get(self.target_index)
    }

    pub fn has_previous(&self) -> bool {
        self.previous_id.is_some()
    }

    pub fn has_next(&self) -> bool {
        self.next_id.is_some()
    }
}

/// Startup parameters for [`App::new`].
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub today: NaiveDate,
    /// Initial date; defaults to `today` and never lies after it.
    pub date: Option<NaiveDate>,
    pub period: Period,
    pub display_mode: DisplayMode,
    pub viewport_height: u16,
}

/// Session state of the browser. Every key press and every delivered
/// [`CommandResult`] mutates it in place; storage work is queued as
/// [`AsyncCommand`]s for the runner to pick up.
pub struct App {
    pub view: View,
    help_return: View,

    // ── Time navigation ───────────────────────────────────────────────
    pub today: NaiveDate,
    pub current_date: NaiveDate,
    pub period: Period,
    /// Day remembered while the user looks at coarser periods.
    pub anchor_date: Option<NaiveDate>,

    // ── Filtering ─────────────────────────────────────────────────────
    pub display_mode: DisplayMode,
    pub filter: String,
    pub filter_editing: bool,
    filter_before_edit: String,

    // ── Loaded period / summary ───────────────────────────────────────
    pub loading: bool,
    grouped: GroupedCommands,
    pub contexts: Vec<ContextSummary>,
    pub selected_context: usize,

    // ── Context detail ────────────────────────────────────────────────
    pub detail_context: Option<ContextKey>,
    pub detail_orphaned: bool,
    pub detail_buckets: Vec<Bucket>,
    pub detail_commands: Vec<Command>,
    pub detail_selected: usize,
    pub detail_scroll: usize,
    pub peek: Option<PeekState>,

    // ── Command detail ────────────────────────────────────────────────
    pub command_detail: Option<CommandDetail>,
    pub window_loading: bool,
    last_viewed_command: Option<i64>,

    // ── Async bookkeeping ─────────────────────────────────────────────
    pending_reentry: Option<ContextKey>,
    range_generation: u64,
    window_generation: u64,
    peek_generation: u64,
    pending_commands: Vec<AsyncCommand>,

    pub viewport_height: u16,
    pub flash_message: Option<(String, FlashLevel)>,
}

impl App {
    /// Build the initial state and queue the first period load.
    pub fn new(options: AppOptions) -> Self {
        let current_date = options.date.unwrap_or(options.today).min(options.today);
        let mut app = Self {
            view: View::Summary,
            help_return: View::Summary,
            today: options.today,
            current_date,
            period: options.period,
            anchor_date: None,
            display_mode: options.display_mode,
            filter: String::new(),
            filter_editing: false,
            filter_before_edit: String::new(),
            loading: false,
            grouped: GroupedCommands::new(),
            contexts: Vec::new(),
            selected_context: 0,
            detail_context: None,
            detail_orphaned: false,
            detail_buckets: Vec::new(),
            detail_commands: Vec::new(),
            detail_selected: 0,
            detail_scroll: 0,
            peek: None,
            command_detail: None,
            window_loading: false,
            last_viewed_command: None,
            pending_reentry: None,
            range_generation: 0,
            window_generation: 0,
            peek_generation: 0,
            pending_commands: Vec::new(),
            viewport_height: options.viewport_height,
            flash_message: None,
        };
        app.request_range_load();
        app
    }

    /// Storage work queued since the last call.
    pub fn take_pending_commands(&mut self) -> Vec<AsyncCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    pub fn refresh_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height;
        self.update_detail_scroll();
    }

    pub fn flash_info(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Info));
    }

    pub fn flash_error(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Error));
    }

    /// True when the current date lies in the same period as today.
    pub fn is_latest_period(&self) -> bool {
        self.period.same_period(self.current_date, self.today)
    }

    pub fn period_label(&self) -> String {
        self.period.describe(self.current_date)
    }

    pub fn context_hints(&self) -> ContextHints {
        peek::context_hints(
            &self.contexts,
            self.detail_context.as_ref(),
            self.detail_orphaned,
        )
    }

    /// The view drawn under the help overlay, or the current view.
    pub fn underlying_view(&self) -> View {
        if self.view == View::Help {
            self.help_return
        } else {
            self.view
        }
    }

    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.detail_buckets.iter().map(Bucket::len).collect()
    }

    fn context_index(&self, key: &ContextKey) -> Option<usize> {
        self.contexts.iter().position(|row| &row.key == key)
    }

    // ── Key handling ──────────────────────────────────────────────────

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Clear flash message on any key press
        self.flash_message = None;

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.filter_editing {
            self.handle_filter_key(key.code);
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('?') => {
                self.toggle_help();
                return false;
            }
            _ => {}
        }

        match self.view {
            View::Summary => self.handle_summary_key(key.code),
            View::ContextDetail => self.handle_context_key(key.code),
            View::CommandDetail => self.handle_command_key(key.code),
            View::Help => self.handle_help_key(key.code),
        }
        false
    }

    fn toggle_help(&mut self) {
        if self.view == View::Help {
            self.view = self.help_return;
        } else {
            self.help_return = self.view;
            self.view = View::Help;
        }
    }

    fn handle_help_key(&mut self, key: KeyCode) {
        if key == KeyCode::Esc {
            self.view = self.help_return;
        }
    }

    fn handle_summary_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.contexts.is_empty() {
                    self.selected_context = (self.selected_context + 1).min(self.contexts.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_context = self.selected_context.saturating_sub(1);
            }
            KeyCode::Enter => {
                if self.contexts.is_empty() {
                    self.flash_info("No contexts in this period");
                } else {
                    self.open_context(self.selected_context);
                }
            }
            other => self.handle_navigation_key(other),
        }
    }

    fn handle_context_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.detail_commands.is_empty() {
                    self.detail_selected =
                        (self.detail_selected + 1).min(self.detail_commands.len() - 1);
                }
                self.update_detail_scroll();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.detail_selected = self.detail_selected.saturating_sub(1);
                self.update_detail_scroll();
            }
            KeyCode::Enter => self.open_selected_command(),
            KeyCode::Esc | KeyCode::Backspace => {
                self.pending_reentry = None;
                self.view = View::Summary;
            }
            KeyCode::Char('H') => self.switch_context(false),
            KeyCode::Char('L') => self.switch_context(true),
            other => self.handle_navigation_key(other),
        }
    }

    fn handle_command_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('j') | KeyCode::Down => self.step_command(true),
            KeyCode::Char('k') | KeyCode::Up => self.step_command(false),
            KeyCode::Esc | KeyCode::Backspace => self.leave_command_detail(),
            _ => {}
        }
    }

    /// Keys shared by the summary and context detail views.
    fn handle_navigation_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('h') => self.step_period(-1),
            KeyCode::Char('l') => self.step_period(1),
            KeyCode::Char('t') => self.jump_to(self.today),
            KeyCode::Char('e') => {
                let yesterday = self
                    .today
                    .checked_sub_days(Days::new(1))
                    .unwrap_or(self.today);
                self.jump_to(yesterday);
            }
            KeyCode::Char(']') => self.cycle_period_up(),
            KeyCode::Char('[') => self.cycle_period_down(),
            KeyCode::Char('u') => self.set_display_mode(DisplayMode::Unique),
            KeyCode::Char('a') => self.set_display_mode(DisplayMode::All),
            KeyCode::Char('/') => {
                self.filter_editing = true;
                self.filter_before_edit = self.filter.clone();
            }
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                self.filter_editing = false;
            }
            KeyCode::Esc => {
                self.filter_editing = false;
                let previous = std::mem::take(&mut self.filter_before_edit);
                if previous != self.filter {
                    self.filter = previous;
                    self.reapply_filters();
                }
            }
            KeyCode::Backspace => {
                if self.filter.is_empty() {
                    self.filter_editing = false;
                } else {
                    self.filter.pop();
                    self.reapply_filters();
                }
            }
            KeyCode::Char(c) if !c.is_control() => {
                self.filter.push(c);
                self.reapply_filters();
            }
            _ => {}
        }
    }

    // ── Summary / context detail transitions ──────────────────────────

    fn open_context(&mut self, index: usize) {
        let Some(key) = self.contexts.get(index).map(|row| row.key.clone()) else {
            return;
        };
        // A reload still in flight reselects this context, not the one it was issued from.
        self.pending_reentry = self.loading.then(|| key.clone());
        self.detail_context = Some(key);
        self.selected_context = index;
        self.detail_orphaned = false;
        self.detail_selected = 0;
        self.detail_scroll = 0;
        self.command_detail = None;
        self.last_viewed_command = None;
        self.view = View::ContextDetail;
        self.rebuild_detail();
    }

    fn switch_context(&mut self, forward: bool) {
        let count = self.contexts.len();
        if count == 0 {
            return;
        }
        let current = self
            .detail_context
            .as_ref()
            .and_then(|key| self.context_index(key));
        let target = match current {
            Some(idx) if !self.detail_orphaned => {
                if forward {
                    if idx + 1 >= count {
                        return;
                    }
                    idx + 1
                } else {
                    if idx == 0 {
                        return;
                    }
                    idx - 1
                }
            }
            _ => {
                if forward {
                    0
                } else {
                    count - 1
                }
            }
        };
        self.open_context(target);
    }

    fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
        self.reapply_filters();
    }

    fn reapply_filters(&mut self) {
        self.refresh_summaries();
        if self.view == View::ContextDetail {
            self.detail_selected = 0;
            self.detail_scroll = 0;
            self.rebuild_detail();
        }
    }

    fn refresh_summaries(&mut self) {
        self.contexts = summarize_contexts(&self.grouped, &self.filter, self.display_mode);
        self.selected_context = self
            .selected_context
            .min(self.contexts.len().saturating_sub(1));
    }

    /// Recompute buckets and the flat command list of the detail context.
    fn rebuild_detail(&mut self) {
        let Some(key) = self.detail_context.clone() else {
            self.detail_buckets.clear();
            self.detail_commands.clear();
            self.peek = None;
            return;
        };
        let commands = context_commands(&self.grouped, &key);
        let filtered = filter_commands(&commands, self.display_mode, &self.filter);
        self.detail_buckets = ordered_buckets(bucket_by(&filtered, self.period.granularity()));
        self.detail_commands = self
            .detail_buckets
            .iter()
            .flat_map(|bucket| bucket.commands.iter().cloned())
            .collect();
        self.detail_selected = self
            .detail_selected
            .min(self.detail_commands.len().saturating_sub(1));
        self.update_detail_scroll();

        if self.detail_commands.is_empty() {
            self.request_peeks(&key);
        } else {
            self.peek = None;
        }
    }

    fn update_detail_scroll(&mut self) {
        let available = scroll::available_lines(self.viewport_height);
        self.detail_scroll = scroll::scroll_to_selection(
            self.detail_scroll,
            &self.bucket_sizes(),
            self.detail_selected,
            available,
        );
    }

    // ── Command detail ────────────────────────────────────────────────

    fn open_selected_command(&mut self) {
        let Some(id) = self.detail_commands.get(self.detail_selected).map(|c| c.id) else {
            self.flash_info("No commands to open");
            return;
        };
        self.last_viewed_command = Some(id);
        self.command_detail = None;
        self.view = View::CommandDetail;
        self.request_window(id);
    }

    fn step_command(&mut self, forward: bool) {
        let Some(detail) = &self.command_detail else {
            return;
        };
        let neighbour = if forward {
            detail.next_id
        } else {
            detail.previous_id
        };
        if let Some(id) = neighbour {
            self.request_window(id);
        }
    }

    fn leave_command_detail(&mut self) {
        self.view = View::ContextDetail;
        if let Some(id) = self.last_viewed_command {
            if let Some(pos) = self.detail_commands.iter().position(|c| c.id == id) {
                self.detail_selected = pos;
            }
        }
        self.update_detail_scroll();
    }

    // ── Time navigation ───────────────────────────────────────────────

    fn step_period(&mut self, delta: i32) {
        if delta > 0 && self.is_latest_period() {
            self.flash_info("Already at the latest period");
            return;
        }
        self.current_date = self.period.step(self.current_date, delta).min(self.today);
        self.begin_reload(false);
    }

    fn jump_to(&mut self, date: NaiveDate) {
        self.current_date = date;
        self.period = Period::Day;
        self.anchor_date = None;
        self.begin_reload(true);
    }

    fn cycle_period_up(&mut self) {
        let Some(longer) = self.period.longer() else {
            return;
        };
        if self.period == Period::Day {
            self.anchor_date = Some(self.current_date);
        }
        self.period = longer;
        self.begin_reload(true);
    }

    fn cycle_period_down(&mut self) {
        let Some(shorter) = self.period.shorter() else {
            return;
        };
        if shorter == Period::Day {
            if let Some(anchor) = self.anchor_date.take() {
                self.current_date = anchor;
            }
        }
        self.period = shorter;
        self.begin_reload(true);
    }

    /// Queue a reload of the current period. In the context detail view the
    /// same context is reselected once the data arrives.
    fn begin_reload(&mut self, reset_selection: bool) {
        if self.view == View::ContextDetail {
            self.pending_reentry = self.detail_context.clone();
            self.detail_selected = 0;
            self.detail_scroll = 0;
        } else if reset_selection {
            self.selected_context = 0;
        }
        self.request_range_load();
    }

    // ── Async requests ────────────────────────────────────────────────

    fn request_range_load(&mut self) {
        self.range_generation += 1;
        let (start, end) = self.period.range(self.current_date, &Local);
        self.loading = true;
        tracing::debug!(
            generation = self.range_generation,
            period = %self.period,
            date = %self.current_date,
            "requesting range load"
        );
        self.pending_commands.push(AsyncCommand::LoadRange {
            generation: self.range_generation,
            start,
            end,
        });
    }

    fn request_window(&mut self, target_id: i64) {
        self.window_generation += 1;
        self.window_loading = true;
        let budget = window_budget(self.viewport_height, COMMAND_DETAIL_OVERHEAD);
        self.pending_commands.push(AsyncCommand::LoadWindow {
            generation: self.window_generation,
            target_id,
            budget,
        });
    }

    fn request_peeks(&mut self, context: &ContextKey) {
        self.peek_generation += 1;
        let (state, commands) = peek::plan_peeks(&PeekRequest {
            generation: self.peek_generation,
            context,
            period: self.period,
            current_date: self.current_date,
            today: self.today,
            filter: &self.filter,
            mode: self.display_mode,
        });
        self.peek = Some(state);
        self.pending_commands.extend(commands);
    }

    // ── Async results ─────────────────────────────────────────────────

    pub fn apply_command_result(&mut self, result: CommandResult) {
        match result {
            CommandResult::RangeLoaded { generation, result } => {
                if generation != self.range_generation {
                    tracing::debug!(generation, latest = self.range_generation, "dropping stale range load");
                    return;
                }
                self.loading = false;
                let commands = match result {
                    Ok(commands) => commands,
                    Err(e) => {
                        tracing::warn!("range load failed: {e}");
                        self.flash_error(format!("Load failed: {e}"));
                        Vec::new()
                    }
                };
                self.apply_loaded_commands(&commands);
            }

            CommandResult::WindowLoaded {
                generation,
                budget,
                result,
            } => {
                if generation != self.window_generation {
                    tracing::debug!(generation, latest = self.window_generation, "dropping stale window load");
                    return;
                }
                self.window_loading = false;
                match result {
                    Ok(window) => {
                        if let Some(detail) = CommandDetail::from_window(window, budget) {
                            self.last_viewed_command = detail.target().map(|c| c.id);
                            self.command_detail = Some(detail);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("window load failed: {e}");
                        self.flash_error(format!("Load failed: {e}"));
                    }
                }
            }

            CommandResult::PeekResolved {
                generation,
                direction,
                context,
                label,
                result,
            } => {
                let Some(state) = self.peek.as_mut() else {
                    return;
                };
                if state.generation != generation || state.context != context {
                    tracing::debug!(generation, latest = state.generation, "dropping stale peek");
                    return;
                }
                *state.slot_mut(direction) = match result {
                    Ok(count) => PeekSlot::Ready(PeriodPeek { label, count }),
                    Err(e) => {
                        tracing::warn!("peek for {label} failed: {e}");
                        PeekSlot::Failed
                    }
                };
            }
        }
    }

    fn apply_loaded_commands(&mut self, commands: &[Command]) {
        self.grouped = group_by_context(commands);
        self.refresh_summaries();
        tracing::debug!(
            commands = commands.len(),
            contexts = self.contexts.len(),
            "period loaded"
        );

        if let Some(key) = self.pending_reentry.take() {
            match self.context_index(&key) {
                Some(idx) => {
                    self.selected_context = idx;
                    self.detail_orphaned = false;
                }
                None => self.detail_orphaned = true,
            }
            self.detail_context = Some(key);
            self.rebuild_detail();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::async_ops::run_blocking;
    use crate::peek::PeekDirection;
    use shelltrail_core::store::{MemoryStore, StoreError};
    use shelltrail_core::testing::{command_in, ts_at};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn yesterday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn at(date: NaiveDate, hour: u32, minute: u32) -> i64 {
        ts_at(&Local, date, hour, minute)
    }

    fn cmd(id: i64, text: &str, cwd: &str, ts: i64) -> Command {
        command_in(id, text, cwd, None, None, ts)
    }

    fn session_cmd(id: i64, text: &str, cwd: &str, session: &str, ts: i64) -> Command {
        Command {
            session: Some(session.to_string()),
            ..cmd(id, text, cwd, ts)
        }
    }

    fn options() -> AppOptions {
        AppOptions {
            today: today(),
            date: None,
            period: Period::Day,
            display_mode: DisplayMode::All,
            viewport_height: 40,
        }
    }

    /// Resolve queued commands immediately until the app goes quiet.
    fn settle(app: &mut App, store: &MemoryStore) {
        loop {
            let commands = app.take_pending_commands();
            if commands.is_empty() {
                break;
            }
            for command in commands {
                let result = run_blocking(command, store);
                app.apply_command_result(result);
            }
        }
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn press_settled(app: &mut App, store: &MemoryStore, code: KeyCode) {
        press(app, code);
        settle(app, store);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Today: /a (3 commands, latest at 11:00) and /b (2 commands).
    /// Yesterday: /b and /c only.
    fn fixture() -> MemoryStore {
        let t = today();
        let y = yesterday();
        MemoryStore::new(vec![
            cmd(1, "cargo build", "/a", at(t, 9, 0)),
            cmd(2, "cargo build", "/a", at(t, 9, 30)),
            cmd(3, "cargo test", "/a", at(t, 11, 0)),
            cmd(4, "ls", "/b", at(t, 8, 0)),
            cmd(5, "git status", "/b", at(t, 10, 0)),
            cmd(6, "make", "/b", at(y, 9, 0)),
            cmd(7, "vim notes", "/c", at(y, 15, 0)),
        ])
    }

    fn started(store: &MemoryStore) -> App {
        let mut app = App::new(options());
        settle(&mut app, store);
        app
    }

    fn context_names(app: &App) -> Vec<&str> {
        app.contexts.iter().map(|row| row.key.cwd.as_str()).collect()
    }

    #[test]
    fn startup_loads_today_and_orders_contexts() {
        let store = fixture();
        let app = started(&store);
        assert!(!app.loading);
        assert_eq!(app.view, View::Summary);
        assert_eq!(context_names(&app), vec!["/a", "/b"]);
        assert_eq!(app.contexts[0].total, 3);
    }

    #[test]
    fn summary_selection_is_clamped() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_context, 0);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_context, 1);
    }

    #[test]
    fn enter_context_builds_hourly_buckets() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view, View::ContextDetail);
        assert_eq!(app.detail_context, Some(ContextKey::new("/a", None)));
        assert_eq!(app.bucket_sizes(), vec![2, 1]);
        assert_eq!(app.detail_buckets[0].id, 9);
        assert_eq!(app.detail_buckets[0].count_of("cargo build"), 2);
        assert_eq!(
            app.detail_commands.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(app.peek.is_none());
    }

    #[test]
    fn back_from_context_keeps_summary_index() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.detail_context, Some(ContextKey::new("/b", None)));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.detail_selected, 1, "clamped at the last command");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view, View::Summary);
        assert_eq!(app.selected_context, 1);
    }

    #[test]
    fn command_detail_walks_session_and_restores_selection() {
        let t = today();
        let store = MemoryStore::new(vec![
            session_cmd(1, "cd src", "/a", "s1", at(t, 9, 0)),
            session_cmd(2, "cargo build", "/a", "s1", at(t, 9, 5)),
            session_cmd(3, "cargo test", "/a", "s1", at(t, 9, 10)),
            session_cmd(4, "git diff", "/a", "s2", at(t, 9, 12)),
        ]);
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Down);
        press_settled(&mut app, &store, KeyCode::Enter);
        assert_eq!(app.view, View::CommandDetail);
        let detail = app.command_detail.clone().expect("window loaded");
        assert_eq!(detail.target().map(|c| c.id), Some(2));
        assert_eq!(
            detail.commands.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        press_settled(&mut app, &store, KeyCode::Down);
        let detail = app.command_detail.clone().unwrap();
        assert_eq!(detail.target().map(|c| c.id), Some(3));
        assert!(!detail.has_next(), "s2 is a different session");

        press_settled(&mut app, &store, KeyCode::Down);
        assert_eq!(
            app.command_detail.as_ref().and_then(|d| d.target()).map(|c| c.id),
            Some(3),
            "clamped at the session end"
        );

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view, View::ContextDetail);
        assert_eq!(app.detail_selected, 2);
    }

    #[test]
    fn command_detail_up_at_session_start_is_noop() {
        let t = today();
        let store = MemoryStore::new(vec![
            session_cmd(1, "first", "/a", "s1", at(t, 9, 0)),
            session_cmd(2, "second", "/a", "s1", at(t, 9, 1)),
        ]);
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press_settled(&mut app, &store, KeyCode::Enter);
        press(&mut app, KeyCode::Up);
        assert!(app.take_pending_commands().is_empty());
    }

    #[test]
    fn command_window_respects_budget() {
        let t = today();
        let commands: Vec<Command> = (0..40)
            .map(|i| session_cmd(i, &format!("cmd {i}"), "/a", "s1", at(t, 9, 0) + i))
            .collect();
        let store = MemoryStore::new(commands);
        let mut app = App::new(AppOptions {
            viewport_height: 20,
            ..options()
        });
        settle(&mut app, &store);
        press(&mut app, KeyCode::Enter);
        for _ in 0..20 {
            press(&mut app, KeyCode::Down);
        }
        press_settled(&mut app, &store, KeyCode::Enter);
        let detail = app.command_detail.as_ref().unwrap();
        let budget = window_budget(20, COMMAND_DETAIL_OVERHEAD);
        assert_eq!(detail.commands.len(), budget + 1);
        assert_eq!(detail.target().map(|c| c.id), Some(20));
    }

    #[test]
    fn period_cycle_restores_anchor_date() {
        let store = fixture();
        let mut app = started(&store);
        press_settled(&mut app, &store, KeyCode::Char('h'));
        let anchor = app.current_date;
        assert_eq!(anchor, yesterday());

        press_settled(&mut app, &store, KeyCode::Char(']'));
        assert_eq!(app.period, Period::Week);
        press_settled(&mut app, &store, KeyCode::Char(']'));
        assert_eq!(app.period, Period::Month);
        press_settled(&mut app, &store, KeyCode::Char(']'));
        assert_eq!(app.period, Period::Month, "clamped at month");
        press_settled(&mut app, &store, KeyCode::Char('['));
        press_settled(&mut app, &store, KeyCode::Char('['));
        assert_eq!(app.period, Period::Day);
        assert_eq!(app.current_date, anchor);
        press_settled(&mut app, &store, KeyCode::Char('['));
        assert_eq!(app.period, Period::Day, "clamped at day");
    }

    #[test]
    fn week_view_uses_daily_buckets() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        press_settled(&mut app, &store, KeyCode::Char(']'));
        assert_eq!(app.view, View::ContextDetail);
        assert_eq!(app.detail_context, Some(ContextKey::new("/b", None)));
        // Yesterday (Sunday) belongs to the previous ISO week.
        assert_eq!(app.bucket_sizes(), vec![2]);
        assert_eq!(app.detail_selected, 0);
    }

    #[test]
    fn forward_navigation_stops_at_current_period() {
        let store = fixture();
        let mut app = started(&store);
        let before = (app.current_date, app.period);
        press(&mut app, KeyCode::Char('l'));
        assert_eq!((app.current_date, app.period), before);
        assert!(app.take_pending_commands().is_empty());
        assert!(app.flash_message.is_some());
    }

    #[test]
    fn forward_step_never_passes_today() {
        let store = fixture();
        let mut app = App::new(AppOptions {
            date: Some(NaiveDate::from_ymd_opt(2026, 9, 30).unwrap()),
            period: Period::Month,
            ..options()
        });
        settle(&mut app, &store);
        press_settled(&mut app, &store, KeyCode::Char('l'));
        assert_eq!(app.current_date, today());
        assert!(app.is_latest_period());
    }

    #[test]
    fn reload_reselects_context_or_marks_orphan() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        press_settled(&mut app, &store, KeyCode::Char('h'));
        assert_eq!(app.view, View::ContextDetail);
        assert_eq!(app.detail_context, Some(ContextKey::new("/b", None)));
        assert!(!app.detail_orphaned);
        assert_eq!(app.detail_commands.len(), 1);
        assert_eq!(context_names(&app)[app.selected_context], "/b");

        press(&mut app, KeyCode::Char('H'));
        press_settled(&mut app, &store, KeyCode::Char('l'));
        assert_eq!(app.current_date, today());
        assert!(app.detail_orphaned, "/c has no commands today");
        assert!(app.detail_commands.is_empty());
    }

    #[test]
    fn orphaned_context_redirects_h_and_l() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press_settled(&mut app, &store, KeyCode::Char('h'));
        assert!(app.detail_orphaned);
        assert_eq!(context_names(&app), vec!["/c", "/b"]);

        let hints = app.context_hints();
        assert_eq!(hints.previous, Some(ContextKey::new("/b", None)));
        assert_eq!(hints.next, Some(ContextKey::new("/c", None)));

        press(&mut app, KeyCode::Char('L'));
        assert_eq!(app.detail_context, Some(ContextKey::new("/c", None)));
        assert!(!app.detail_orphaned);

        // /c has nothing today, so H from the orphan wraps to the last row.
        press_settled(&mut app, &store, KeyCode::Char('l'));
        assert!(app.detail_orphaned);
        press(&mut app, KeyCode::Char('H'));
        assert_eq!(app.detail_context, Some(ContextKey::new("/b", None)));
        assert_eq!(app.selected_context, 1);
    }

    #[test]
    fn context_switch_is_clamped() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('H'));
        assert_eq!(app.detail_context, Some(ContextKey::new("/a", None)));
        press(&mut app, KeyCode::Char('L'));
        press(&mut app, KeyCode::Char('L'));
        assert_eq!(app.detail_context, Some(ContextKey::new("/b", None)));
        assert_eq!(app.selected_context, 1);
    }

    #[test]
    fn context_switch_during_reload_survives_delivery() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char('H'));
        assert_eq!(app.detail_context, Some(ContextKey::new("/a", None)));

        settle(&mut app, &store);
        assert_eq!(app.view, View::ContextDetail);
        assert_eq!(app.detail_context, Some(ContextKey::new("/a", None)));
        assert!(app.detail_orphaned, "/a has no commands yesterday");
        assert!(app.detail_commands.is_empty());
    }

    #[test]
    fn reopening_another_context_during_reload_wins() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.detail_context, Some(ContextKey::new("/b", None)));

        settle(&mut app, &store);
        assert_eq!(context_names(&app), vec!["/c", "/b"]);
        assert_eq!(app.detail_context, Some(ContextKey::new("/b", None)));
        assert!(!app.detail_orphaned);
        assert_eq!(app.selected_context, 1);
        let ids: Vec<i64> = app.detail_commands.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![6]);
    }

    #[test]
    fn leaving_detail_during_reload_stays_on_summary() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Esc);
        settle(&mut app, &store);
        assert_eq!(app.view, View::Summary);
        assert_eq!(context_names(&app), vec!["/c", "/b"]);
        assert!(!app.detail_orphaned);
    }

    #[test]
    fn empty_state_peeks_adjacent_periods() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press_settled(&mut app, &store, KeyCode::Char('h'));
        let peek = app.peek.clone().expect("orphaned context peeks");
        assert_eq!(peek.context, ContextKey::new("/a", None));
        assert_eq!(
            peek.previous,
            PeekSlot::Ready(PeriodPeek {
                label: "Sat Oct 17 2026".to_string(),
                count: 0
            })
        );
        assert_eq!(
            peek.next,
            PeekSlot::Ready(PeriodPeek {
                label: "Mon Oct 19 2026".to_string(),
                count: 3
            })
        );
    }

    #[test]
    fn empty_state_in_latest_period_skips_next_peek() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "zzz");
        let commands = app.take_pending_commands();
        assert!(commands.iter().all(|c| matches!(
            c,
            AsyncCommand::PeekPeriod {
                direction: PeekDirection::Previous,
                ..
            }
        )));
        for command in commands {
            app.apply_command_result(run_blocking(command, &store));
        }
        let peek = app.peek.clone().unwrap();
        assert_eq!(peek.next, PeekSlot::Skipped);
        assert_eq!(peek.previous.ready().map(|p| p.count), Some(0));
    }

    #[test]
    fn failed_peek_is_omitted() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "zzz");
        for command in app.take_pending_commands() {
            app.apply_command_result(command.into_failure(StoreError::Backend("down".into())));
        }
        assert_eq!(app.peek.as_ref().map(|p| p.previous.clone()), Some(PeekSlot::Failed));
        assert!(app.flash_message.is_none());
    }

    #[test]
    fn stale_range_delivery_is_discarded() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Char('h'));
        let first = app.take_pending_commands();
        press(&mut app, KeyCode::Char('t'));
        let second = app.take_pending_commands();

        for command in second {
            app.apply_command_result(run_blocking(command, &store));
        }
        assert_eq!(context_names(&app), vec!["/a", "/b"]);
        for command in first {
            app.apply_command_result(run_blocking(command, &store));
        }
        assert_eq!(
            context_names(&app),
            vec!["/a", "/b"],
            "yesterday's late delivery must not overwrite today"
        );
    }

    #[test]
    fn filter_entry_live_updates_and_escape_restores() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('/'));
        assert!(app.filter_editing);
        type_text(&mut app, "test");
        assert_eq!(app.detail_commands.len(), 1);
        assert_eq!(app.contexts[0].filtered, 1);

        press(&mut app, KeyCode::Esc);
        assert!(!app.filter_editing);
        assert_eq!(app.filter, "");
        assert_eq!(app.detail_commands.len(), 3);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "build");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.filter, "build");
        assert_eq!(app.detail_commands.len(), 2);

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.filter, "build", "escape restores the pre-edit text");
    }

    #[test]
    fn backspace_on_empty_filter_closes_entry() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "a");
        press(&mut app, KeyCode::Backspace);
        assert!(app.filter_editing);
        assert_eq!(app.filter, "");
        press(&mut app, KeyCode::Backspace);
        assert!(!app.filter_editing);
    }

    #[test]
    fn filter_entry_captures_q_but_ctrl_c_quits() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Char('/'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.filter, "q");
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn quit_from_any_view() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        assert!(press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Char('?'));
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn unique_mode_filters_and_resets_selection() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.display_mode, DisplayMode::Unique);
        assert_eq!(app.detail_selected, 0);
        assert_eq!(
            app.detail_commands.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![3]
        );
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.detail_commands.len(), 3);
    }

    #[test]
    fn help_returns_to_prior_view() {
        let store = fixture();
        let mut app = started(&store);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.view, View::Help);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.view, View::Help);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.view, View::ContextDetail);
        press(&mut app, KeyCode::Char('?'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view, View::ContextDetail);
    }

    #[test]
    fn today_and_yesterday_reset_period() {
        let store = fixture();
        let mut app = started(&store);
        press_settled(&mut app, &store, KeyCode::Char(']'));
        press(&mut app, KeyCode::Down);
        press_settled(&mut app, &store, KeyCode::Char('e'));
        assert_eq!(app.period, Period::Day);
        assert_eq!(app.current_date, yesterday());
        assert_eq!(app.selected_context, 0);
        assert_eq!(app.anchor_date, None);
        press_settled(&mut app, &store, KeyCode::Char('t'));
        assert_eq!(app.current_date, today());
    }

    #[test]
    fn load_failure_is_flashed() {
        let mut app = App::new(options());
        for command in app.take_pending_commands() {
            app.apply_command_result(command.into_failure(StoreError::Backend("locked".into())));
        }
        assert!(!app.loading);
        assert!(app.contexts.is_empty());
        assert!(matches!(app.flash_message, Some((_, FlashLevel::Error))));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view, View::Summary);
    }

    #[test]
    fn scroll_keeps_selection_visible() {
        let t = today();
        let commands: Vec<Command> = (0..30)
            .map(|i| cmd(i, &format!("step {i}"), "/a", at(t, 8 + (i as u32 % 5), (i as u32) % 60)))
            .collect();
        let store = MemoryStore::new(commands);
        let mut app = App::new(AppOptions {
            viewport_height: 10,
            ..options()
        });
        settle(&mut app, &store);
        press(&mut app, KeyCode::Enter);
        let available = scroll::available_lines(app.viewport_height);
        let check = |app: &App| {
            let line = scroll::locate(&app.bucket_sizes(), app.detail_selected)
                .unwrap()
                .line;
            assert!(app.detail_scroll <= line && line < app.detail_scroll + available);
        };
        for _ in 0..40 {
            press(&mut app, KeyCode::Down);
            check(&app);
        }
        for _ in 0..40 {
            press(&mut app, KeyCode::Up);
            check(&app);
        }
        assert_eq!(app.detail_scroll, 0, "back at the top shows the first header");
    }
}
