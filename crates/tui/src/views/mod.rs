pub mod command_detail;
pub mod context_detail;
pub mod help;
pub mod summary;

use chrono::{Local, TimeZone};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncate `s` to at most `max` display columns, marking the cut with `…`.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Truncate or right-pad `s` to exactly `width` display columns.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let mut out = truncate_to_width(s, width);
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat_n(' ', pad));
    out
}

/// Local wall-clock time, `HH:MM`.
pub fn clock(timestamp: i64) -> String {
    clock_in(&Local, timestamp)
}

fn clock_in<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> String
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_opt(timestamp, 0)
        .earliest()
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Local date and time, `Oct 19 09:30`.
pub fn short_date(timestamp: i64) -> String {
    Local
        .timestamp_opt(timestamp, 0)
        .earliest()
        .map(|dt| dt.format("%b %-d %H:%M").to_string())
        .unwrap_or_default()
}

pub fn format_duration(ms: i64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        let secs = ms / 1_000;
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
