use serde::{Deserialize, Serialize};
use std::fmt;

/// A single executed shell command as loaded from the history store.
///
/// Commands are immutable once loaded; every view derives its own
/// groupings and buckets from fresh copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    pub id: i64,
    /// The command line exactly as the user typed it.
    pub command: String,
    /// Working directory the command ran in.
    pub cwd: String,
    /// Repository identifier (usually the repo root or remote), if inside one.
    pub repo: Option<String>,
    pub branch: Option<String>,
    /// Unix timestamp (seconds).
    pub timestamp: i64,
    pub exit_status: i32,
    pub duration_ms: Option<i64>,
    /// Identity of the originating shell process/session.
    pub session: Option<String>,
}

impl Command {
    pub fn context_key(&self) -> ContextKey {
        ContextKey::new(&self.cwd, self.repo.as_deref())
    }

    pub fn branch_key(&self) -> BranchKey {
        BranchKey::from_branch(self.branch.as_deref())
    }

    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }
}

/// Primary grouping unit: a working directory paired with its repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextKey {
    pub cwd: String,
    /// Empty when the directory is not inside a repository.
    pub repo: String,
}

impl ContextKey {
    pub fn new(cwd: &str, repo: Option<&str>) -> Self {
        Self {
            cwd: cwd.to_string(),
            repo: repo.unwrap_or_default().to_string(),
        }
    }

    pub fn has_repo(&self) -> bool {
        !self.repo.is_empty()
    }

    /// Short name for headers and hints: the last path component of the directory.
    pub fn short_name(&self) -> &str {
        self.cwd
            .trim_end_matches('/')
            .rsplit('/')
            .find(|part| !part.is_empty())
            .unwrap_or(self.cwd.as_str())
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.repo.is_empty() {
            write!(f, "{}", self.cwd)
        } else {
            write!(f, "{} ({})", self.cwd, self.repo)
        }
    }
}

/// Branch within a context. Missing and empty branch names collapse into `NoBranch`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BranchKey {
    Named(String),
    NoBranch,
}

impl BranchKey {
    pub fn from_branch(branch: Option<&str>) -> Self {
        match branch {
            Some(name) if !name.is_empty() => Self::Named(name.to_string()),
            _ => Self::NoBranch,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NoBranch => "(no branch)",
        }
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn empty_branch_normalizes_to_sentinel() {
        assert_eq!(BranchKey::from_branch(None), BranchKey::NoBranch);
        assert_eq!(BranchKey::from_branch(Some("")), BranchKey::NoBranch);
        assert_eq!(
            BranchKey::from_branch(Some("main")),
            BranchKey::Named("main".to_string())
        );
    }

    #[test]
    fn context_key_compares_by_value() {
        let a = testing::command_in(1, "ls", "/src/app", Some("app"), None, 0);
        let b = testing::command_in(2, "pwd", "/src/app", Some("app"), Some("dev"), 10);
        assert_eq!(a.context_key(), b.context_key());
        assert_ne!(
            a.context_key(),
            ContextKey::new("/src/app", None),
            "missing repo must not equal a named repo"
        );
    }

    #[test]
    fn short_name_uses_last_component() {
        assert_eq!(ContextKey::new("/home/me/src/app/", None).short_name(), "app");
        assert_eq!(ContextKey::new("/", None).short_name(), "/");
    }

    #[test]
    fn command_serializes_round_trip_fields() {
        let cmd = testing::command(7, "cargo test", 1_700_000_000);
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "cargo test");
        assert_eq!(json["timestamp"], 1_700_000_000);
    }
}
