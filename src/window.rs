/*
Calendar windows and per-day selection of tasks and sessions.

"Local day" is the wall-clock date of a timestamp in the offset it was
recorded with. The server stamps new records with the host's local offset,
so this matches the host's calendar without consulting it at read time.
*/

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate};
use tracing::debug;

use crate::models::{PomodoroSession, Task};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

// Current time in the host's local offset
pub fn local_now() -> DateTime<FixedOffset> {
    chrono::Local::now().fixed_offset()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            debug!(key, %err, "unparsable date key");
            None
        }
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn local_day(ts: &DateTime<FixedOffset>) -> NaiveDate {
    ts.date_naive()
}

/// True when `ts` falls on the calendar day named by `key`.
/// An unparsable key matches nothing.
pub fn is_same_local_day(ts: &DateTime<FixedOffset>, key: &str) -> bool {
    parse_date_key(key).is_some_and(|date| local_day(ts) == date)
}

// Completed tasks whose completedAt falls on `date`.
//
// A task flagged completed without a completedAt never qualifies.
pub fn completed_tasks_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| t.completed)
        .filter(|t| t.completed_at.is_some_and(|ts| local_day(&ts) == date))
        .collect()
}

// Sessions that started on `date`, completed or not.
// Completion is filtered by the aggregator.
pub fn sessions_on(sessions: &[PomodoroSession], date: NaiveDate) -> Vec<&PomodoroSession> {
    sessions
        .iter()
        .filter(|s| s.start_time.is_some_and(|ts| local_day(&ts) == date))
        .collect()
}

pub fn filter_completed_tasks_on_date<'a>(tasks: &'a [Task], key: &str) -> Vec<&'a Task> {
    match parse_date_key(key) {
        Some(date) => completed_tasks_on(tasks, date),
        None => Vec::new(),
    }
}

pub fn filter_sessions_on_date<'a>(
    sessions: &'a [PomodoroSession],
    key: &str,
) -> Vec<&'a PomodoroSession> {
    match parse_date_key(key) {
        Some(date) => sessions_on(sessions, date),
        None => Vec::new(),
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

// 28..=31
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = month_start(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

pub fn window_dates(start: NaiveDate, len_days: u32) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take(len_days as usize)
}
