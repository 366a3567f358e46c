use crate::Command;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether repeated commands are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    All,
    /// Only commands whose text occurs exactly once in the filtered set.
    Unique,
}

impl DisplayMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Unique => "unique",
        }
    }
}

/// Keep commands whose text contains `filter` verbatim (case-sensitive).
/// An empty filter keeps everything.
pub fn filter_by_text(commands: &[Command], filter: &str) -> Vec<Command> {
    if filter.is_empty() {
        return commands.to_vec();
    }
    commands
        .iter()
        .filter(|cmd| cmd.command.contains(filter))
        .cloned()
        .collect()
}

fn text_frequencies<'a>(commands: impl Iterator<Item = &'a Command>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for cmd in commands {
        *counts.entry(cmd.command.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Apply the display mode to an already text-filtered list.
pub fn apply_display_mode(commands: Vec<Command>, mode: DisplayMode) -> Vec<Command> {
    match mode {
        DisplayMode::All => commands,
        DisplayMode::Unique => {
            let counts = text_frequencies(commands.iter());
            let keep: Vec<bool> = commands
                .iter()
                .map(|cmd| counts.get(cmd.command.as_str()) == Some(&1))
                .collect();
            commands
                .into_iter()
                .zip(keep)
                .filter_map(|(cmd, keep)| keep.then_some(cmd))
                .collect()
        }
    }
}

/// Substring filter first, then the display mode over the surviving set.
pub fn filter_commands(commands: &[Command], mode: DisplayMode, filter: &str) -> Vec<Command> {
    apply_display_mode(filter_by_text(commands, filter), mode)
}

/// Same result as `filter_commands(..).len()` without materializing the list.
pub fn filtered_command_count(commands: &[Command], mode: DisplayMode, filter: &str) -> usize {
    let matching = commands
        .iter()
        .filter(|cmd| filter.is_empty() || cmd.command.contains(filter));
    match mode {
        DisplayMode::All => matching.count(),
        DisplayMode::Unique => text_frequencies(matching)
            .values()
            .filter(|&&n| n == 1)
            .count(),
    }
}
