use crate::Command;
use chrono::{NaiveDate, TimeZone};

/// Default working directory used by the builders below.
pub const DEFAULT_CWD: &str = "/home/dev/project";

/// Successful command in [`DEFAULT_CWD`] without repository or session.
pub fn command(id: i64, text: &str, timestamp: i64) -> Command {
    Command {
        id,
        command: text.to_string(),
        cwd: DEFAULT_CWD.to_string(),
        repo: None,
        branch: None,
        timestamp,
        exit_status: 0,
        duration_ms: None,
        session: None,
    }
}

/// Command with an explicit directory, repository and branch.
pub fn command_in(
    id: i64,
    text: &str,
    cwd: &str,
    repo: Option<&str>,
    branch: Option<&str>,
    timestamp: i64,
) -> Command {
    Command {
        cwd: cwd.to_string(),
        repo: repo.map(str::to_string),
        branch: branch.map(str::to_string),
        ..command(id, text, timestamp)
    }
}

/// Command tagged with an originating shell session.
pub fn command_in_session(id: i64, text: &str, session: &str, timestamp: i64) -> Command {
    Command {
        session: Some(session.to_string()),
        ..command(id, text, timestamp)
    }
}

/// Unix timestamp for `date` at `hour:minute` in the given timezone.
pub fn ts_at<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32, minute: u32) -> i64 {
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .expect("valid wall-clock time");
    tz.from_local_datetime(&naive)
        .earliest()
        .expect("unambiguous local time")
        .timestamp()
}
