use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use shelltrail_core::Command;
use shelltrail_core::store::{CommandStore, StoreError};
use shelltrail_core::window::CommandWindow;
use std::path::Path;
use std::sync::Mutex;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS commands (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    command     TEXT    NOT NULL,
    cwd         TEXT    NOT NULL,
    repo        TEXT,
    branch      TEXT,
    timestamp   INTEGER NOT NULL,
    exit_status INTEGER NOT NULL DEFAULT 0,
    duration_ms INTEGER,
    session     TEXT
);
CREATE INDEX IF NOT EXISTS idx_commands_timestamp ON commands(timestamp);
CREATE INDEX IF NOT EXISTS idx_commands_session ON commands(session, timestamp);
";

const COLUMNS: &str =
    "id, command, cwd, repo, branch, timestamp, exit_status, duration_ms, session";

/// A command about to be recorded; the database assigns the id.
#[derive(Debug, Clone, Default)]
pub struct NewCommand {
    pub command: String,
    pub cwd: String,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub timestamp: i64,
    pub exit_status: i32,
    pub duration_ms: Option<i64>,
    pub session: Option<String>,
}

/// Local SQLite command history.
/// Thread-safe: wraps the connection in a Mutex so it can be shared via `Arc<LocalDb>`.
pub struct LocalDb {
    conn: Mutex<Connection>,
}

impl LocalDb {
    /// Open (or create) the database at `path`.
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir for {}", path.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA).context("apply history schema")?;
        tracing::debug!(path = %path.display(), "opened history db");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("local db mutex poisoned")
    }

    pub fn insert_command(&self, cmd: &NewCommand) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO commands \
             (command, cwd, repo, branch, timestamp, exit_status, duration_ms, session) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &cmd.command,
                &cmd.cwd,
                &cmd.repo,
                &cmd.branch,
                cmd.timestamp,
                cmd.exit_status,
                cmd.duration_ms,
                &cmd.session,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn command_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM commands", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn list_range(&self, start: i64, end: i64, filter: Option<&str>) -> Result<Vec<Command>> {
        let conn = self.conn();
        let rows = match filter.filter(|f| !f.is_empty()) {
            Some(filter) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM commands \
                     WHERE timestamp >= ?1 AND timestamp < ?2 AND instr(command, ?3) > 0 \
                     ORDER BY timestamp ASC, id ASC"
                ))?;
                stmt.query_map(params![start, end, filter], row_to_command)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM commands \
                     WHERE timestamp >= ?1 AND timestamp < ?2 \
                     ORDER BY timestamp ASC, id ASC"
                ))?;
                stmt.query_map(params![start, end], row_to_command)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    fn get_command(&self, id: i64) -> Result<Option<Command>> {
        let conn = self.conn();
        let cmd = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM commands WHERE id = ?1"),
                params![id],
                row_to_command,
            )
            .optional()?;
        Ok(cmd)
    }

    fn session_neighbours(&self, target: &Command, budget: usize) -> Result<CommandWindow> {
        let Some(session) = target.session.as_deref() else {
            return Ok(CommandWindow {
                before: Vec::new(),
                target: Some(target.clone()),
                after: Vec::new(),
            });
        };
        let limit = i64::try_from(budget).unwrap_or(i64::MAX);
        let conn = self.conn();

        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM commands \
             WHERE session = ?1 AND (timestamp < ?2 OR (timestamp = ?2 AND id < ?3)) \
             ORDER BY timestamp DESC, id DESC LIMIT ?4"
        ))?;
        let mut before = stmt
            .query_map(
                params![session, target.timestamp, target.id, limit],
                row_to_command,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        before.reverse();

        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM commands \
             WHERE session = ?1 AND (timestamp > ?2 OR (timestamp = ?2 AND id > ?3)) \
             ORDER BY timestamp ASC, id ASC LIMIT ?4"
        ))?;
        let after = stmt
            .query_map(
                params![session, target.timestamp, target.id, limit],
                row_to_command,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(CommandWindow {
            before,
            target: Some(target.clone()),
            after,
        })
    }
}

impl CommandStore for LocalDb {
    fn commands_by_date_range(
        &self,
        start: i64,
        end: i64,
        filter: Option<&str>,
    ) -> Result<Vec<Command>, StoreError> {
        let rows = self
            .list_range(start, end, filter)
            .map_err(|e| StoreError::Backend(format!("{e:#}")))?;
        tracing::debug!(start, end, rows = rows.len(), "loaded command range");
        Ok(rows)
    }

    fn command_with_context(
        &self,
        target_id: i64,
        budget: usize,
    ) -> Result<CommandWindow, StoreError> {
        let target = self
            .get_command(target_id)
            .map_err(|e| StoreError::Backend(format!("{e:#}")))?
            .ok_or(StoreError::NotFound(target_id))?;
        self.session_neighbours(&target, budget)
            .map_err(|e| StoreError::Backend(format!("{e:#}")))
    }
}

fn row_to_command(row: &rusqlite::Row) -> rusqlite::Result<Command> {
    Ok(Command {
        id: row.get(0)?,
        command: row.get(1)?,
        cwd: row.get(2)?,
        repo: row.get(3)?,
        branch: row.get(4)?,
        timestamp: row.get(5)?,
        exit_status: row.get(6)?,
        duration_ms: row.get(7)?,
        session: row.get(8)?,
    })
}
