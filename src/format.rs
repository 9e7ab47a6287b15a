/*
Display formatting for minute totals, counts and clock readouts.
Values coming from stored data may be malformed, so every formatter
clamps instead of failing.
*/

use chrono::{Datelike, Duration, NaiveDate};

const WEEKDAY_LABELS: [&str; 7] = ["周一", "周二", "周三", "周四", "周五", "周六", "周日"];

/// How a minute total is rendered.
///
/// `Compact` drops the hour unit below one hour ("45分钟"), `Full` always
/// shows it ("0小时45分钟") so week and month columns line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationStyle {
    Compact,
    Full,
}

// NaN and negatives become 0, fractions are floored.
fn whole_minutes(minutes: f64) -> u64 {
    if minutes.is_nan() || minutes <= 0.0 {
        0
    } else {
        minutes.floor() as u64
    }
}

pub fn format_minutes(minutes: f64, style: DurationStyle) -> String {
    let total = whole_minutes(minutes);
    let hours = total / 60;
    let rest = total % 60;

    match style {
        DurationStyle::Compact if hours == 0 => format!("{rest}分钟"),
        _ => format!("{hours}小时{rest}分钟"),
    }
}

/// "0分钟", "45分钟", "1小时5分钟". No day unit: 1500 minutes is "25小时0分钟".
pub fn format_duration(minutes: f64) -> String {
    format_minutes(minutes, DurationStyle::Compact)
}

/// Like [`format_duration`] but always with the hour unit: "0小时0分钟".
pub fn format_duration_full(minutes: f64) -> String {
    format_minutes(minutes, DurationStyle::Full)
}

pub fn format_pomodoro_count(count: i64) -> String {
    format!("{}个番茄钟", count.max(0))
}

// Countdown readout, "MM:SS". Minutes are not wrapped into hours.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Chart labels for a Monday-anchored week: "周一 7/22" .. "周日 7/28".
pub fn week_labels(week_start: NaiveDate) -> Vec<String> {
    WEEKDAY_LABELS
        .iter()
        .enumerate()
        .map(|(i, weekday)| {
            let date = week_start + Duration::days(i as i64);
            format!("{} {}/{}", weekday, date.month(), date.day())
        })
        .collect()
}
