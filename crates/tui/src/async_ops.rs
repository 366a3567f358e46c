use std::sync::Arc;

use shelltrail_core::filter::{DisplayMode, filtered_command_count};
use shelltrail_core::group::{context_commands, group_by_context};
use shelltrail_core::store::{CommandStore, StoreError};
use shelltrail_core::window::CommandWindow;
use shelltrail_core::{Command, ContextKey};

use crate::peek::PeekDirection;

/// Storage work the UI wants done off the update step. Each request carries
/// the generation it was issued under so late deliveries can be recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncCommand {
    /// Commands of one period, `[start, end)`.
    LoadRange { generation: u64, start: i64, end: i64 },
    /// Session neighbours of a command, up to `budget` on each side.
    LoadWindow {
        generation: u64,
        target_id: i64,
        budget: usize,
    },
    /// Post-filter command count of `context` in an adjacent period.
    PeekPeriod {
        generation: u64,
        direction: PeekDirection,
        context: ContextKey,
        start: i64,
        end: i64,
        label: String,
        filter: String,
        mode: DisplayMode,
    },
}

/// Completed storage work, delivered back to the update step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    RangeLoaded {
        generation: u64,
        result: Result<Vec<Command>, StoreError>,
    },
    WindowLoaded {
        generation: u64,
        budget: usize,
        result: Result<CommandWindow, StoreError>,
    },
    PeekResolved {
        generation: u64,
        direction: PeekDirection,
        context: ContextKey,
        label: String,
        result: Result<usize, StoreError>,
    },
}

impl AsyncCommand {
    /// The result this command produces when it could not run at all.
    pub fn into_failure(self, error: StoreError) -> CommandResult {
        match self {
            Self::LoadRange { generation, .. } => CommandResult::RangeLoaded {
                generation,
                result: Err(error),
            },
            Self::LoadWindow {
                generation, budget, ..
            } => CommandResult::WindowLoaded {
                generation,
                budget,
                result: Err(error),
            },
            Self::PeekPeriod {
                generation,
                direction,
                context,
                label,
                ..
            } => CommandResult::PeekResolved {
                generation,
                direction,
                context,
                label,
                result: Err(error),
            },
        }
    }
}

/// Run a command synchronously against `store`.
pub fn run_blocking(cmd: AsyncCommand, store: &dyn CommandStore) -> CommandResult {
    match cmd {
        AsyncCommand::LoadRange {
            generation,
            start,
            end,
        } => CommandResult::RangeLoaded {
            generation,
            result: store.commands_by_date_range(start, end, None),
        },

        AsyncCommand::LoadWindow {
            generation,
            target_id,
            budget,
        } => CommandResult::WindowLoaded {
            generation,
            budget,
            result: store.command_with_context(target_id, budget),
        },

        AsyncCommand::PeekPeriod {
            generation,
            direction,
            context,
            start,
            end,
            label,
            filter,
            mode,
        } => {
            let query_filter = (!filter.is_empty()).then_some(filter.as_str());
            let result = store
                .commands_by_date_range(start, end, query_filter)
                .map(|commands| {
                    let grouped = group_by_context(&commands);
                    let in_context = context_commands(&grouped, &context);
                    filtered_command_count(&in_context, mode, &filter)
                });
            CommandResult::PeekResolved {
                generation,
                direction,
                context,
                label,
                result,
            }
        }
    }
}

/// Run a command on the blocking pool so storage I/O never stalls the runtime.
pub async fn execute(cmd: AsyncCommand, store: Arc<dyn CommandStore>) -> CommandResult {
    let fallback = cmd.clone();
    match tokio::task::spawn_blocking(move || run_blocking(cmd, store.as_ref())).await {
        Ok(result) => result,
        Err(e) => fallback.into_failure(StoreError::Backend(format!("background load failed: {e}"))),
    }
}
