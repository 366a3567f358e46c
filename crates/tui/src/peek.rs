//! Hints shown when the active context has nothing to display.
//!
//! Context hints come straight from the loaded summary rows. Period hints
//! need a storage round trip and arrive later as `PeekResolved` results.

use chrono::{Local, NaiveDate};
use shelltrail_core::ContextKey;
use shelltrail_core::filter::DisplayMode;
use shelltrail_core::group::ContextSummary;
use shelltrail_core::period::Period;

use crate::async_ops::AsyncCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeekDirection {
    Previous,
    Next,
}

/// Resolved hint for an adjacent period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodPeek {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PeekSlot {
    /// Not requested (e.g. the next period is in the future).
    #[default]
    Skipped,
    Pending,
    Ready(PeriodPeek),
    /// The lookup failed; nothing is shown.
    Failed,
}

impl PeekSlot {
    pub fn ready(&self) -> Option<&PeriodPeek> {
        match self {
            Self::Ready(peek) => Some(peek),
            _ => None,
        }
    }
}

/// Period hints for one context, tied to the generation that requested them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeekState {
    pub generation: u64,
    pub context: ContextKey,
    pub previous: PeekSlot,
    pub next: PeekSlot,
}

impl PeekState {
    pub fn slot_mut(&mut self, direction: PeekDirection) -> &mut PeekSlot {
        match direction {
            PeekDirection::Previous => &mut self.previous,
            PeekDirection::Next => &mut self.next,
        }
    }
}

/// Contexts reachable with H/L from the current detail view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextHints {
    pub previous: Option<ContextKey>,
    pub next: Option<ContextKey>,
}

/// Neighbouring contexts in summary order. An orphaned context has no
/// position, so H points at the last context and L at the first.
pub fn context_hints(
    contexts: &[ContextSummary],
    current: Option<&ContextKey>,
    orphaned: bool,
) -> ContextHints {
    if contexts.is_empty() {
        return ContextHints::default();
    }
    let position = current.and_then(|key| contexts.iter().position(|row| &row.key == key));
    match position {
        Some(idx) if !orphaned => ContextHints {
            previous: idx
                .checked_sub(1)
                .and_then(|i| contexts.get(i))
                .map(|row| row.key.clone()),
            next: contexts.get(idx + 1).map(|row| row.key.clone()),
        },
        _ => ContextHints {
            previous: contexts.last().map(|row| row.key.clone()),
            next: contexts.first().map(|row| row.key.clone()),
        },
    }
}

/// Everything needed to issue period peeks for one context.
pub struct PeekRequest<'a> {
    pub generation: u64,
    pub context: &'a ContextKey,
    pub period: Period,
    pub current_date: NaiveDate,
    pub today: NaiveDate,
    pub filter: &'a str,
    pub mode: DisplayMode,
}

/// Build the peek state plus the storage commands to resolve it. The next
/// period is only queried when the user could navigate to it.
pub fn plan_peeks(request: &PeekRequest<'_>) -> (PeekState, Vec<AsyncCommand>) {
    let mut state = PeekState {
        generation: request.generation,
        context: request.context.clone(),
        previous: PeekSlot::Pending,
        next: PeekSlot::Skipped,
    };
    let mut commands = vec![peek_command(request, PeekDirection::Previous)];
    if !request
        .period
        .same_period(request.current_date, request.today)
    {
        state.next = PeekSlot::Pending;
        commands.push(peek_command(request, PeekDirection::Next));
    }
    (state, commands)
}

fn peek_command(request: &PeekRequest<'_>, direction: PeekDirection) -> AsyncCommand {
    let delta = match direction {
        PeekDirection::Previous => -1,
        PeekDirection::Next => 1,
    };
    let date = request.period.step(request.current_date, delta);
    let (start, end) = request.period.range(date, &Local);
    AsyncCommand::PeekPeriod {
        generation: request.generation,
        direction,
        context: request.context.clone(),
        start,
        end,
        label: request.period.describe(date),
        filter: request.filter.to_string(),
        mode: request.mode,
    }
}
