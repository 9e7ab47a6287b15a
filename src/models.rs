use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[serde(alias = "low")]
    Low,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub estimated_pomodoros: i64,
    #[serde(default)]
    pub pomodoros_used: i64,
}

// Body of a task creation request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub estimated_pomodoros: Option<i64>, // defaults to 1
}

// Shallow update: only the fields present are replaced
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub estimated_pomodoros: Option<i64>,
    pub pomodoros_used: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn is_break(self) -> bool {
        matches!(self, SessionType::ShortBreak | SessionType::LongBreak)
    }
}

// One finished timer phase. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSession {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    #[serde(default)]
    pub duration: i64, // minutes; may be malformed (negative) in stored data
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    #[serde(default)]
    pub completed: bool,
}

// Body of a session recording request; the server assigns the id
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub duration: i64,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub task_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub completed: bool,
}

fn default_true() -> bool {
    true
}

impl NewSession {
    pub fn into_session(self) -> PomodoroSession {
        PomodoroSession {
            id: Uuid::new_v4(),
            session_type: self.session_type,
            duration: self.duration,
            start_time: Some(self.start_time),
            end_time: self.end_time,
            task_id: self.task_id,
            completed: self.completed,
        }
    }
}

/// Stats for one calendar day. Also the persisted snapshot shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: String, // "YYYY-MM-DD"
    #[serde(default)]
    pub total_pomodoros: u32,
    #[serde(default)]
    pub work_time: u64, // minutes
    #[serde(default)]
    pub break_time: u64, // minutes
    #[serde(default)]
    pub tasks_completed: u32,
    #[serde(default)]
    pub focus_score: u32, // 0..=100
}

impl DailyStats {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }
}

// Partial DailyStats used by snapshot writes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatsPatch {
    pub total_pomodoros: Option<u32>,
    pub work_time: Option<u64>,
    pub break_time: Option<u64>,
    pub tasks_completed: Option<u32>,
    pub focus_score: Option<u32>,
}

impl From<&DailyStats> for DailyStatsPatch {
    fn from(s: &DailyStats) -> Self {
        Self {
            total_pomodoros: Some(s.total_pomodoros),
            work_time: Some(s.work_time),
            break_time: Some(s.break_time),
            tasks_completed: Some(s.tasks_completed),
            focus_score: Some(s.focus_score),
        }
    }
}

/// Rollup over a run of consecutive days, before it is labelled as a week or month.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    pub start: String,
    pub daily_stats: Vec<DailyStats>,
    pub total_pomodoros: u32,
    pub average_focus_score: f64,
    pub most_productive_day: String, // "" when the window has no work time
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub week_start: String, // Monday
    pub daily_stats: Vec<DailyStats>,
    pub total_pomodoros: u32,
    pub average_focus_score: f64,
    pub most_productive_day: String,
}

impl From<WindowStats> for WeeklyStats {
    fn from(w: WindowStats) -> Self {
        Self {
            week_start: w.start,
            daily_stats: w.daily_stats,
            total_pomodoros: w.total_pomodoros,
            average_focus_score: w.average_focus_score,
            most_productive_day: w.most_productive_day,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub month_start: String,
    pub daily_stats: Vec<DailyStats>,
    pub total_pomodoros: u32,
    pub average_focus_score: f64,
    pub most_productive_day: String,
}

impl From<WindowStats> for MonthlyStats {
    fn from(w: WindowStats) -> Self {
        Self {
            month_start: w.start,
            daily_stats: w.daily_stats,
            total_pomodoros: w.total_pomodoros,
            average_focus_score: w.average_focus_score,
            most_productive_day: w.most_productive_day,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    pub work_duration: u32,        // minutes
    pub short_break_duration: u32, // minutes
    pub long_break_duration: u32,  // minutes
    pub long_break_interval: u32,  // work sessions per long break
    pub auto_start_breaks: bool,
    pub auto_start_pomodoros: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            long_break_interval: 4,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
        }
    }
}

/// Longest phase the timer accepts, in minutes.
pub const MAX_PHASE_MINUTES: u32 = 24 * 60;

impl TimerSettings {
    // Phase length in seconds; stored settings are not trusted to fit.
    pub fn seconds_for(&self, session_type: SessionType) -> u32 {
        self.minutes_for(session_type).saturating_mul(60)
    }

    pub fn minutes_for(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Work => self.work_duration,
            SessionType::ShortBreak => self.short_break_duration,
            SessionType::LongBreak => self.long_break_duration,
        }
    }
}

// Explicit nulls read the same as missing fields
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Db {
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: TimerSettings,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: Vec<PomodoroSession>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub daily: Vec<DailyStats>,
}
