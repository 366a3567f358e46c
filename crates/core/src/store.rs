use crate::Command;
use crate::window::CommandWindow;

/// Failures surfaced by a history store.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("command {0} not found")]
    NotFound(i64),
    #[error("history store error: {0}")]
    Backend(String),
}

/// Read access to recorded command history.
///
/// Implementations are shared across the UI thread and background loaders,
/// so they must be `Send + Sync`.
pub trait CommandStore: Send + Sync {
    /// Commands with `start <= timestamp < end`, oldest first. When `filter`
    /// is given only commands whose text contains it (case-sensitive) are returned.
    fn commands_by_date_range(
        &self,
        start: i64,
        end: i64,
        filter: Option<&str>,
    ) -> Result<Vec<Command>, StoreError>;

    /// Up to `budget` commands of the target's session on each side of it.
    fn command_with_context(&self, target_id: i64, budget: usize)
    -> Result<CommandWindow, StoreError>;
}

/// In-memory store over a fixed command list.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    commands: Vec<Command>,
}

impl MemoryStore {
    pub fn new(mut commands: Vec<Command>) -> Self {
        commands.sort_by_key(|cmd| (cmd.timestamp, cmd.id));
        Self { commands }
    }
}

impl CommandStore for MemoryStore {
    fn commands_by_date_range(
        &self,
        start: i64,
        end: i64,
        filter: Option<&str>,
    ) -> Result<Vec<Command>, StoreError> {
        Ok(self
            .commands
            .iter()
            .filter(|cmd| cmd.timestamp >= start && cmd.timestamp < end)
            .filter(|cmd| filter.is_none_or(|f| cmd.command.contains(f)))
            .cloned()
            .collect())
    }

    fn command_with_context(
        &self,
        target_id: i64,
        budget: usize,
    ) -> Result<CommandWindow, StoreError> {
        let target = self
            .commands
            .iter()
            .find(|cmd| cmd.id == target_id)
            .cloned()
            .ok_or(StoreError::NotFound(target_id))?;
        let Some(session) = target.session.as_deref() else {
            return Ok(CommandWindow {
                before: Vec::new(),
                target: Some(target),
                after: Vec::new(),
            });
        };
        let same_session: Vec<&Command> = self
            .commands
            .iter()
            .filter(|cmd| cmd.session.as_deref() == Some(session))
            .collect();
        let pos = same_session
            .iter()
            .position(|cmd| cmd.id == target_id)
            .unwrap_or(0);
        let before = same_session[pos.saturating_sub(budget)..pos]
            .iter()
            .map(|cmd| (*cmd).clone())
            .collect();
        let after = same_session
            .iter()
            .skip(pos + 1)
            .take(budget)
            .map(|cmd| (*cmd).clone())
            .collect();
        Ok(CommandWindow {
            before,
            target: Some(target),
            after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{command, command_in_session};

    #[test]
    fn range_is_half_open_and_filtered() {
        let store = MemoryStore::new(vec![
            command(1, "ls", 10),
            command(2, "cargo build", 20),
            command(3, "cargo test", 30),
        ]);
        let ids: Vec<i64> = store
            .commands_by_date_range(10, 30, None)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
        let filtered = store.commands_by_date_range(0, 100, Some("cargo")).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn context_window_stays_in_session() {
        let store = MemoryStore::new(vec![
            command_in_session(1, "a", "s1", 10),
            command_in_session(2, "b", "s2", 15),
            command_in_session(3, "c", "s1", 20),
            command_in_session(4, "d", "s1", 30),
            command_in_session(5, "e", "s1", 40),
        ]);
        let window = store.command_with_context(4, 1).unwrap();
        assert_eq!(window.before.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3]);
        assert_eq!(window.target.map(|c| c.id), Some(4));
        assert_eq!(window.after.iter().map(|c| c.id).collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn missing_target_is_not_found() {
        let store = MemoryStore::default();
        assert_eq!(
            store.command_with_context(9, 3).unwrap_err(),
            StoreError::NotFound(9)
        );
    }
}
