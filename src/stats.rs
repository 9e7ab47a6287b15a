/*
Statistics aggregation.
Turns the task and session collections into daily stats, hourly focus
distribution and week/month rollups. Pure functions over borrowed
snapshots: nothing here mutates its input or fails.
*/

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::format::{format_duration_full, format_duration};
use crate::models::{
    DailyStats, MonthlyStats, PomodoroSession, SessionType, Task, WeeklyStats, WindowStats,
};
use crate::score::focus_score;
use crate::window::{
    completed_tasks_on, date_key, days_in_month, local_day, month_start, parse_date_key,
    sessions_on, week_start, window_dates,
};

fn minutes(session: &PomodoroSession) -> u64 {
    session.duration.max(0) as u64
}

// Durations come from clients unchecked; sums saturate instead of wrapping.
fn total_minutes<'a>(sessions: impl Iterator<Item = &'a PomodoroSession>) -> u64 {
    sessions.fold(0, |acc, s| acc.saturating_add(minutes(s)))
}

/// Stats for a single calendar day.
///
/// Only completed sessions count. Work sessions feed `workTime` and
/// `totalPomodoros` (one per session, whatever its length), breaks feed
/// `breakTime`. Negative durations count as 0.
pub fn daily_stats(tasks: &[Task], sessions: &[PomodoroSession], date: NaiveDate) -> DailyStats {
    let done_tasks = completed_tasks_on(tasks, date);
    let finished: Vec<&PomodoroSession> = sessions_on(sessions, date)
        .into_iter()
        .filter(|s| s.completed)
        .collect();

    let work: Vec<&PomodoroSession> = finished
        .iter()
        .copied()
        .filter(|s| s.session_type == SessionType::Work)
        .collect();

    let work_time = total_minutes(work.iter().copied());
    let break_time = total_minutes(finished.iter().copied().filter(|s| s.session_type.is_break()));

    DailyStats {
        date: date_key(date),
        total_pomodoros: work.len() as u32,
        work_time,
        break_time,
        tasks_completed: done_tasks.len() as u32,
        focus_score: focus_score(&done_tasks, &work),
    }
}

// Same as daily_stats, keyed by "YYYY-MM-DD".
// An unparsable key yields an all-zero record carrying the key as given.
pub fn calculate_daily_stats(tasks: &[Task], sessions: &[PomodoroSession], key: &str) -> DailyStats {
    match parse_date_key(key) {
        Some(date) => daily_stats(tasks, sessions, date),
        None => DailyStats::empty(key),
    }
}

pub fn today_stats(
    tasks: &[Task],
    sessions: &[PomodoroSession],
    now: DateTime<FixedOffset>,
) -> DailyStats {
    daily_stats(tasks, sessions, local_day(&now))
}

/// Minutes of completed work per local hour of `key`'s day.
///
/// A session counts entirely toward the hour it started in, even when it
/// runs past the hour mark. Hours without focus are absent from the map.
/// An unparsable key gives an empty map.
pub fn hourly_focus_distribution(key: &str, sessions: &[PomodoroSession]) -> BTreeMap<u32, u64> {
    let mut by_hour = BTreeMap::new();
    let Some(date) = parse_date_key(key) else {
        return by_hour;
    };

    for s in sessions
        .iter()
        .filter(|s| s.completed && s.session_type == SessionType::Work)
    {
        let Some(start) = s.start_time else { continue };
        if local_day(&start) != date {
            continue;
        }
        let total = by_hour.entry(start.hour()).or_insert(0u64);
        *total = total.saturating_add(minutes(s));
    }

    by_hour.retain(|_, total| *total > 0);
    by_hour
}

// First day holding the largest workTime; "" if no day has any.
pub fn most_productive_day(days: &[DailyStats]) -> String {
    let mut best: Option<&DailyStats> = None;
    for day in days {
        if best.is_none_or(|b| day.work_time > b.work_time) {
            best = Some(day);
        }
    }

    match best {
        Some(day) if day.work_time > 0 => day.date.clone(),
        _ => String::new(),
    }
}

/// Fold already computed days into window totals.
///
/// The average focus score is taken over every day given, idle days
/// included, and rounded to one decimal.
pub fn summarize_window(start: NaiveDate, days: &[DailyStats]) -> WindowStats {
    if days.is_empty() {
        return WindowStats {
            start: date_key(start),
            ..WindowStats::default()
        };
    }

    let total_pomodoros = days.iter().map(|d| d.total_pomodoros).sum();
    let score_sum: u64 = days.iter().map(|d| u64::from(d.focus_score)).sum();
    let average = score_sum as f64 / days.len() as f64;

    WindowStats {
        start: date_key(start),
        daily_stats: days.to_vec(),
        total_pomodoros,
        average_focus_score: (average * 10.0).round() / 10.0,
        most_productive_day: most_productive_day(days),
    }
}

pub fn build_window_stats(
    start: NaiveDate,
    len_days: u32,
    tasks: &[Task],
    sessions: &[PomodoroSession],
) -> WindowStats {
    let days: Vec<DailyStats> = window_dates(start, len_days)
        .map(|date| daily_stats(tasks, sessions, date))
        .collect();

    let window = summarize_window(start, &days);
    debug!(
        start = %window.start,
        days = len_days,
        total_pomodoros = window.total_pomodoros,
        "built window stats"
    );
    window
}

// Week (Monday..Sunday) containing `anchor`
pub fn weekly_stats(anchor: NaiveDate, tasks: &[Task], sessions: &[PomodoroSession]) -> WeeklyStats {
    build_window_stats(week_start(anchor), 7, tasks, sessions).into()
}

// Calendar month containing `anchor`
pub fn monthly_stats(anchor: NaiveDate, tasks: &[Task], sessions: &[PomodoroSession]) -> MonthlyStats {
    build_window_stats(month_start(anchor), days_in_month(anchor), tasks, sessions).into()
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Week,
    Month,
}

impl Period {
    pub fn window(self, anchor: NaiveDate) -> (NaiveDate, u32) {
        match self {
            Period::Week => (week_start(anchor), 7),
            Period::Month => (month_start(anchor), days_in_month(anchor)),
        }
    }
}

pub fn period_stats(
    period: Period,
    anchor: NaiveDate,
    tasks: &[Task],
    sessions: &[PomodoroSession],
) -> WindowStats {
    let (start, len) = period.window(anchor);
    build_window_stats(start, len, tasks, sessions)
}

/// Headline figures for a week or month view.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period: Period,
    pub start: String,
    pub days: u32,
    pub focus_days: u32,
    pub total_focus_time: u64,
    pub average_focus_time: u64, // per day with focus
    pub total_pomodoros: u32,
    pub completed_tasks: u32,
    pub average_focus_score: f64,
    pub most_productive_day: String,
    pub is_empty: bool,
    pub total_focus_time_formatted: String,
    pub average_focus_time_formatted: String,
    pub total_pomodoros_formatted: String,
    pub average_focus_score_formatted: String,
}

impl PeriodSummary {
    pub fn from_window(period: Period, window: &WindowStats) -> Self {
        let days = &window.daily_stats;
        let focus_days = days.iter().filter(|d| d.work_time > 0).count() as u32;
        let total_focus_time = days.iter().fold(0u64, |acc, d| acc.saturating_add(d.work_time));
        let average_focus_time = if focus_days > 0 {
            (total_focus_time as f64 / f64::from(focus_days)).round() as u64
        } else {
            0
        };

        Self {
            period,
            start: window.start.clone(),
            days: days.len() as u32,
            focus_days,
            total_focus_time,
            average_focus_time,
            total_pomodoros: window.total_pomodoros,
            completed_tasks: days.iter().map(|d| d.tasks_completed).sum(),
            average_focus_score: window.average_focus_score,
            most_productive_day: window.most_productive_day.clone(),
            is_empty: window.total_pomodoros == 0,
            total_focus_time_formatted: format_duration_full(total_focus_time as f64),
            average_focus_time_formatted: format_duration(average_focus_time as f64),
            total_pomodoros_formatted: format!("{}个", window.total_pomodoros),
            average_focus_score_formatted: format!("{}分", window.average_focus_score.round()),
        }
    }
}
