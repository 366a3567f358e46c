use crate::Command;
use crate::period::{local_midnight, week_start};
use chrono::{Local, TimeZone, Timelike};
use std::collections::{BTreeMap, HashMap};

/// Size of the time windows commands are grouped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// Bucket id is the local hour (0-23).
    Hourly,
    /// Bucket id is the unix timestamp of local midnight.
    Daily,
    /// Bucket id is the unix timestamp of local midnight on the ISO-week Monday.
    Weekly,
}

/// A time window of commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub id: i64,
    pub commands: Vec<Command>,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
    /// Occurrences of each command text within this bucket.
    pub command_counts: HashMap<String, usize>,
}

impl Bucket {
    fn new(id: i64, first: &Command) -> Self {
        Self {
            id,
            commands: Vec::new(),
            first_timestamp: first.timestamp,
            last_timestamp: first.timestamp,
            command_counts: HashMap::new(),
        }
    }

    fn push(&mut self, cmd: Command) {
        self.first_timestamp = self.first_timestamp.min(cmd.timestamp);
        self.last_timestamp = self.last_timestamp.max(cmd.timestamp);
        *self.command_counts.entry(cmd.command.clone()).or_insert(0) += 1;
        self.commands.push(cmd);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn count_of(&self, text: &str) -> usize {
        self.command_counts.get(text).copied().unwrap_or(0)
    }

    /// Most repeated command text, ties going to the text seen first.
    pub fn top_command(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for cmd in &self.commands {
            let count = self.count_of(&cmd.command);
            if best.is_none_or(|(_, n)| count > n) {
                best = Some((cmd.command.as_str(), count));
            }
        }
        best
    }
}

/// Buckets keyed by id. Iteration order is ascending id, which is chronological.
pub type BucketMap = BTreeMap<i64, Bucket>;

/// Bucket id of `timestamp` at the given granularity in `tz`.
pub fn bucket_id<Tz: TimeZone>(timestamp: i64, granularity: Granularity, tz: &Tz) -> i64 {
    let Some(local) = tz.timestamp_opt(timestamp, 0).earliest() else {
        return timestamp;
    };
    let date = local.date_naive();
    match granularity {
        Granularity::Hourly => i64::from(local.hour()),
        Granularity::Daily => local_midnight(tz, date),
        Granularity::Weekly => local_midnight(tz, week_start(date)),
    }
}

/// Header label of bucket `id`: `09:00`, `Mon Oct 19` or `Week of Oct 12`.
pub fn bucket_label_in<Tz: TimeZone>(id: i64, granularity: Granularity, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let format = match granularity {
        Granularity::Hourly => return format!("{id:02}:00"),
        Granularity::Daily => "%a %b %-d",
        Granularity::Weekly => "Week of %b %-d",
    };
    tz.timestamp_opt(id, 0)
        .earliest()
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_else(|| id.to_string())
}

/// [`bucket_label_in`] for the local timezone.
pub fn bucket_label(id: i64, granularity: Granularity) -> String {
    bucket_label_in(id, granularity, &Local)
}

/// Partition commands into buckets using the given timezone.
pub fn bucket_by_in<Tz: TimeZone>(
    commands: &[Command],
    granularity: Granularity,
    tz: &Tz,
) -> BucketMap {
    let mut buckets = BucketMap::new();
    for cmd in commands {
        let id = bucket_id(cmd.timestamp, granularity, tz);
        buckets
            .entry(id)
            .or_insert_with(|| Bucket::new(id, cmd))
            .push(cmd.clone());
    }
    buckets
}

/// Partition commands into buckets in the local timezone.
pub fn bucket_by(commands: &[Command], granularity: Granularity) -> BucketMap {
    bucket_by_in(commands, granularity, &Local)
}

/// Bucket ids in ascending order.
pub fn ordered_bucket_ids(buckets: &BucketMap) -> Vec<i64> {
    buckets.keys().copied().collect()
}

/// Buckets in ascending id order.
pub fn ordered_buckets(buckets: BucketMap) -> Vec<Bucket> {
    buckets.into_values().collect()
}
