use crate::bucket::Granularity;
use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Navigation granularity: governs the query range and the detail-view buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
}

impl Period {
    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn granularity(self) -> Granularity {
        match self {
            Self::Day => Granularity::Hourly,
            Self::Week => Granularity::Daily,
            Self::Month => Granularity::Weekly,
        }
    }

    /// Next coarser period, `None` at Month.
    pub fn longer(self) -> Option<Self> {
        match self {
            Self::Day => Some(Self::Week),
            Self::Week => Some(Self::Month),
            Self::Month => None,
        }
    }

    /// Next finer period, `None` at Day.
    pub fn shorter(self) -> Option<Self> {
        match self {
            Self::Day => None,
            Self::Week => Some(Self::Day),
            Self::Month => Some(Self::Week),
        }
    }

    /// First calendar day of the period instance containing `date`.
    pub fn start_date(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => week_start(date),
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// First calendar day after the period instance containing `date`.
    pub fn end_date(self, date: NaiveDate) -> NaiveDate {
        let start = self.start_date(date);
        let next = match self {
            Self::Day => start.checked_add_days(Days::new(1)),
            Self::Week => start.checked_add_days(Days::new(7)),
            Self::Month => start.checked_add_months(Months::new(1)),
        };
        next.unwrap_or(start)
    }

    /// Half-open unix-timestamp range `[start, end)` of the period containing `date`.
    pub fn range<Tz: TimeZone>(self, date: NaiveDate, tz: &Tz) -> (i64, i64) {
        (
            local_midnight(tz, self.start_date(date)),
            local_midnight(tz, self.end_date(date)),
        )
    }

    /// Move `date` by `delta` period units. Month steps clamp the day to the
    /// target month's length. Out-of-range results leave the date unchanged.
    pub fn step(self, date: NaiveDate, delta: i32) -> NaiveDate {
        let n = u64::from(delta.unsigned_abs());
        let moved = match (self, delta >= 0) {
            (Self::Day, true) => date.checked_add_days(Days::new(n)),
            (Self::Day, false) => date.checked_sub_days(Days::new(n)),
            (Self::Week, true) => date.checked_add_days(Days::new(n * 7)),
            (Self::Week, false) => date.checked_sub_days(Days::new(n * 7)),
            (Self::Month, true) => date.checked_add_months(Months::new(delta.unsigned_abs())),
            (Self::Month, false) => date.checked_sub_months(Months::new(delta.unsigned_abs())),
        };
        moved.unwrap_or(date)
    }

    /// True when both dates fall in the same period instance.
    pub fn same_period(self, a: NaiveDate, b: NaiveDate) -> bool {
        self.start_date(a) == self.start_date(b)
    }

    /// Human-readable label of the period instance containing `date`.
    pub fn describe(self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%a %b %-d %Y").to_string(),
            Self::Week => format!("Week of {}", week_start(date).format("%b %-d")),
            Self::Month => date.format("%B %Y").to_string(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "d" => Ok(Self::Day),
            "week" | "w" => Ok(Self::Week),
            "month" | "m" => Ok(Self::Month),
            other => Err(format!("unknown period `{other}` (expected day, week or month)")),
        }
    }
}

/// Monday of the ISO week containing `date`; Sunday belongs to the week that ends on it.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// Unix timestamp of local midnight starting `date`. When a DST transition
/// skips midnight, the first valid instant of that day is used.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            (1..=3)
                .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
                .find_map(|t| tz.from_local_datetime(&date.and_time(t)).earliest())
        })
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| naive.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_starts_on_monday_and_sunday_closes_it() {
        // 2026-10-19 is a Monday.
        assert_eq!(week_start(d(2026, 10, 19)), d(2026, 10, 19));
        assert_eq!(week_start(d(2026, 10, 22)), d(2026, 10, 19));
        assert_eq!(week_start(d(2026, 10, 25)), d(2026, 10, 19));
        assert_eq!(week_start(d(2026, 10, 26)), d(2026, 10, 26));
    }

    #[test]
    fn ranges_are_half_open_midnights() {
        let (start, end) = Period::Day.range(d(2026, 10, 19), &Utc);
        assert_eq!(end - start, 86_400);
        let (wstart, wend) = Period::Week.range(d(2026, 10, 22), &Utc);
        assert_eq!(wstart, local_midnight(&Utc, d(2026, 10, 19)));
        assert_eq!(wend - wstart, 7 * 86_400);
        let (mstart, mend) = Period::Month.range(d(2026, 2, 14), &Utc);
        assert_eq!(mstart, local_midnight(&Utc, d(2026, 2, 1)));
        assert_eq!(mend, local_midnight(&Utc, d(2026, 3, 1)));
    }

    #[test]
    fn ranges_follow_the_timezone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let (start, _) = Period::Day.range(d(2026, 10, 19), &tz);
        assert_eq!(start, local_midnight(&Utc, d(2026, 10, 19)) - 2 * 3600);
    }

    #[test]
    fn month_step_clamps_day() {
        assert_eq!(Period::Month.step(d(2026, 3, 31), -1), d(2026, 2, 28));
        assert_eq!(Period::Month.step(d(2026, 1, 31), 1), d(2026, 2, 28));
        assert_eq!(Period::Week.step(d(2026, 10, 19), -1), d(2026, 10, 12));
        assert_eq!(Period::Day.step(d(2026, 1, 1), -1), d(2025, 12, 31));
    }

    #[test]
    fn same_period_compares_instances() {
        assert!(Period::Week.same_period(d(2026, 10, 19), d(2026, 10, 25)));
        assert!(!Period::Week.same_period(d(2026, 10, 25), d(2026, 10, 26)));
        assert!(Period::Month.same_period(d(2026, 10, 1), d(2026, 10, 31)));
        assert!(!Period::Day.same_period(d(2026, 10, 1), d(2026, 10, 2)));
    }

    #[test]
    fn cycling_is_clamped() {
        assert_eq!(Period::Month.longer(), None);
        assert_eq!(Period::Day.shorter(), None);
        assert_eq!(Period::Day.longer(), Some(Period::Week));
        assert_eq!(Period::Month.shorter(), Some(Period::Week));
    }

    #[test]
    fn describe_labels() {
        assert_eq!(Period::Day.describe(d(2026, 10, 19)), "Mon Oct 19 2026");
        assert_eq!(Period::Week.describe(d(2026, 10, 21)), "Week of Oct 19");
        assert_eq!(Period::Month.describe(d(2026, 9, 3)), "September 2026");
    }

    #[test]
    fn parses_from_str() {
        assert_eq!("Week".parse::<Period>(), Ok(Period::Week));
        assert_eq!("m".parse::<Period>(), Ok(Period::Month));
        assert!("year".parse::<Period>().is_err());
    }
}
