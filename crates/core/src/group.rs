use crate::filter::{DisplayMode, filtered_command_count};
use crate::{BranchKey, Command, ContextKey};
use serde::Serialize;
use std::collections::HashMap;

/// Commands grouped by context, then by branch. Input order is preserved
/// inside every branch list.
pub type GroupedCommands = HashMap<ContextKey, HashMap<BranchKey, Vec<Command>>>;

/// Group commands by (directory, repository) and branch.
pub fn group_by_context(commands: &[Command]) -> GroupedCommands {
    let mut grouped = GroupedCommands::new();
    for cmd in commands {
        grouped
            .entry(cmd.context_key())
            .or_default()
            .entry(cmd.branch_key())
            .or_default()
            .push(cmd.clone());
    }
    grouped
}

/// All commands of one context across its branches, in timestamp order.
pub fn context_commands(grouped: &GroupedCommands, key: &ContextKey) -> Vec<Command> {
    let Some(branches) = grouped.get(key) else {
        return Vec::new();
    };
    let mut commands: Vec<Command> = branches.values().flatten().cloned().collect();
    commands.sort_by_key(|cmd| (cmd.timestamp, cmd.id));
    commands
}

/// One row of the summary view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    pub key: ContextKey,
    pub total: usize,
    /// Count after the substring filter and display mode are applied.
    pub filtered: usize,
    /// Per-branch command counts, largest first.
    pub branches: Vec<(BranchKey, usize)>,
    pub last_timestamp: i64,
}

/// Build summary rows ordered by most recent activity, then directory, then repository.
pub fn summarize_contexts(
    grouped: &GroupedCommands,
    filter: &str,
    mode: DisplayMode,
) -> Vec<ContextSummary> {
    let mut rows: Vec<ContextSummary> = grouped
        .iter()
        .map(|(key, branches)| {
            let commands = context_commands(grouped, key);
            let mut branch_counts: Vec<(BranchKey, usize)> = branches
                .iter()
                .map(|(branch, cmds)| (branch.clone(), cmds.len()))
                .collect();
            branch_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ContextSummary {
                key: key.clone(),
                total: commands.len(),
                filtered: filtered_command_count(&commands, mode, filter),
                branches: branch_counts,
                last_timestamp: commands.iter().map(|c| c.timestamp).max().unwrap_or(0),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.last_timestamp
            .cmp(&a.last_timestamp)
            .then_with(|| a.key.cwd.cmp(&b.key.cwd))
            .then_with(|| a.key.repo.cmp(&b.key.repo))
    });
    rows
}
