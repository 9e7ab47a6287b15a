// Fixture builders shared by unit tests.

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::models::{PomodoroSession, Priority, SessionType, Task};

pub fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

pub fn session(
    session_type: SessionType,
    duration: i64,
    start: DateTime<FixedOffset>,
    completed: bool,
) -> PomodoroSession {
    PomodoroSession {
        id: Uuid::new_v4(),
        session_type,
        duration,
        start_time: Some(start),
        end_time: Some(start + chrono::Duration::minutes(duration.max(0))),
        task_id: None,
        completed,
    }
}

pub fn done_task(estimated: i64, used: i64, completed_at: DateTime<FixedOffset>) -> Task {
    Task {
        id: Uuid::new_v4(),
        title: "write report".to_string(),
        description: None,
        priority: Priority::Medium,
        completed: true,
        created_at: completed_at - chrono::Duration::hours(2),
        completed_at: Some(completed_at),
        estimated_pomodoros: estimated,
        pomodoros_used: used,
    }
}

pub fn open_task(created_at: DateTime<FixedOffset>) -> Task {
    Task {
        id: Uuid::new_v4(),
        title: "read chapter".to_string(),
        description: None,
        priority: Priority::Low,
        completed: false,
        created_at,
        completed_at: None,
        estimated_pomodoros: 1,
        pomodoros_used: 0,
    }
}
