use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{PomodoroSession, SessionType, TimerSettings};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer is already running")]
    AlreadyRunning,

    #[error("timer is not running")]
    NotRunning,
}

/// Countdown over work / short break / long break phases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroTimer {
    pub is_running: bool,
    pub is_paused: bool,
    pub current_time: u32, // seconds left
    pub total_time: u32,   // seconds in this phase
    pub session_type: SessionType,
    pub sessions_completed: u32, // work phases finished in this cycle
    pub started_at: Option<DateTime<FixedOffset>>,
    pub task_id: Option<Uuid>,
}

impl PomodoroTimer {
    pub fn new(settings: &TimerSettings) -> Self {
        let total = settings.seconds_for(SessionType::Work);
        Self {
            is_running: false,
            is_paused: false,
            current_time: total,
            total_time: total,
            session_type: SessionType::Work,
            sessions_completed: 0,
            started_at: None,
            task_id: None,
        }
    }

    pub fn start(
        &mut self,
        now: DateTime<FixedOffset>,
        task_id: Option<Uuid>,
    ) -> Result<(), TimerError> {
        if self.is_running {
            return Err(TimerError::AlreadyRunning);
        }
        self.is_running = true;
        self.is_paused = false;
        self.started_at.get_or_insert(now);
        if task_id.is_some() {
            self.task_id = task_id;
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        if !self.is_running {
            return Err(TimerError::NotRunning);
        }
        self.is_running = false;
        self.is_paused = true;
        Ok(())
    }

    // Back to a fresh work phase; the cycle counter starts over.
    pub fn stop(&mut self, settings: &TimerSettings) {
        let task_id = self.task_id;
        *self = Self::new(settings);
        self.task_id = task_id;
    }

    // Current phase back to its full length, idle.
    pub fn reset(&mut self, settings: &TimerSettings) {
        let total = settings.seconds_for(self.session_type);
        self.current_time = total;
        self.total_time = total;
        self.is_running = false;
        self.is_paused = false;
        self.started_at = None;
    }

    /// Count down; true once a running phase has reached zero.
    pub fn tick(&mut self, seconds: u32) -> bool {
        if !self.is_running {
            return false;
        }
        self.current_time = self.current_time.saturating_sub(seconds);
        self.current_time == 0
    }

    pub fn progress(&self) -> f64 {
        if self.total_time == 0 {
            return 0.0;
        }
        1.0 - f64::from(self.current_time) / f64::from(self.total_time)
    }

    /// Finish the current phase and move to the next one.
    ///
    /// Returns the finished session. After a work phase comes a long break
    /// every `long_break_interval` work phases, a short break otherwise;
    /// after any break comes work.
    pub fn complete(
        &mut self,
        settings: &TimerSettings,
        now: DateTime<FixedOffset>,
    ) -> Result<PomodoroSession, TimerError> {
        let Some(started_at) = self.started_at else {
            return Err(TimerError::NotRunning);
        };

        let minutes = settings.minutes_for(self.session_type);
        let session = PomodoroSession {
            id: Uuid::new_v4(),
            session_type: self.session_type,
            duration: i64::from(minutes),
            start_time: Some(started_at),
            end_time: Some(now),
            task_id: match self.session_type {
                SessionType::Work => self.task_id,
                _ => None,
            },
            completed: true,
        };

        let next = match self.session_type {
            SessionType::Work => {
                self.sessions_completed += 1;
                if self.sessions_completed % settings.long_break_interval.max(1) == 0 {
                    SessionType::LongBreak
                } else {
                    SessionType::ShortBreak
                }
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
        };

        let total = settings.seconds_for(next);
        self.session_type = next;
        self.current_time = total;
        self.total_time = total;
        self.is_running = settings.auto_start_pomodoros || settings.auto_start_breaks;
        self.is_paused = false;
        self.started_at = self.is_running.then_some(now);

        Ok(session)
    }

    // A new work length applies at once to an idle work phase.
    pub fn apply_settings(&mut self, previous: &TimerSettings, settings: &TimerSettings) {
        let idle_work = self.session_type == SessionType::Work && !self.is_running;
        if idle_work && previous.work_duration != settings.work_duration {
            let total = settings.seconds_for(SessionType::Work);
            self.current_time = total;
            self.total_time = total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::at;

    fn run_phase(timer: &mut PomodoroTimer, settings: &TimerSettings, now: &str) -> PomodoroSession {
        if !timer.is_running {
            timer.start(at(now), None).unwrap();
        }
        timer.complete(settings, at(now)).unwrap()
    }

    #[test]
    fn start_and_pause_guard_state() {
        let settings = TimerSettings::default();
        let mut timer = PomodoroTimer::new(&settings);
        assert_eq!(timer.pause(), Err(TimerError::NotRunning));

        timer.start(at("2024-08-01T09:00:00+00:00"), None).unwrap();
        assert_eq!(
            timer.start(at("2024-08-01T09:01:00+00:00"), None),
            Err(TimerError::AlreadyRunning)
        );

        timer.pause().unwrap();
        assert!(timer.is_paused);
        // resuming keeps the original start
        timer.start(at("2024-08-01T09:05:00+00:00"), None).unwrap();
        assert_eq!(timer.started_at, Some(at("2024-08-01T09:00:00+00:00")));
    }

    #[test]
    fn tick_counts_down_only_while_running() {
        let settings = TimerSettings::default();
        let mut timer = PomodoroTimer::new(&settings);
        assert!(!timer.tick(60));
        assert_eq!(timer.current_time, 1500);

        timer.start(at("2024-08-01T09:00:00+00:00"), None).unwrap();
        assert!(!timer.tick(1499));
        assert!(timer.tick(5));
        assert_eq!(timer.current_time, 0);
        assert_eq!(timer.progress(), 1.0);
    }

    #[test]
    fn cycle_reaches_long_break_on_interval() {
        let settings = TimerSettings::default();
        let mut timer = PomodoroTimer::new(&settings);

        let mut kinds = Vec::new();
        for _ in 0..8 {
            run_phase(&mut timer, &settings, "2024-08-01T09:25:00+00:00");
            kinds.push(timer.session_type);
        }

        use SessionType::*;
        assert_eq!(
            kinds,
            vec![ShortBreak, Work, ShortBreak, Work, ShortBreak, Work, LongBreak, Work]
        );
        assert_eq!(timer.sessions_completed, 4);
    }

    #[test]
    fn completed_session_carries_phase_and_task() {
        let settings = TimerSettings::default();
        let mut timer = PomodoroTimer::new(&settings);
        let task = Uuid::new_v4();

        timer.start(at("2024-08-01T09:00:00+00:00"), Some(task)).unwrap();
        let work = timer.complete(&settings, at("2024-08-01T09:25:00+00:00")).unwrap();
        assert_eq!(work.session_type, SessionType::Work);
        assert_eq!(work.duration, 25);
        assert_eq!(work.task_id, Some(task));
        assert_eq!(work.start_time, Some(at("2024-08-01T09:00:00+00:00")));
        assert!(work.completed);

        assert!(!timer.is_running);
        assert_eq!(timer.current_time, 5 * 60);

        let rest = run_phase(&mut timer, &settings, "2024-08-01T09:30:00+00:00");
        assert_eq!(rest.session_type, SessionType::ShortBreak);
        assert_eq!(rest.task_id, None);
    }

    #[test]
    fn complete_requires_a_started_phase() {
        let settings = TimerSettings::default();
        let mut timer = PomodoroTimer::new(&settings);
        assert_eq!(
            timer.complete(&settings, at("2024-08-01T09:00:00+00:00")),
            Err(TimerError::NotRunning)
        );
    }

    #[test]
    fn auto_start_runs_next_phase() {
        let settings = TimerSettings {
            auto_start_breaks: true,
            ..TimerSettings::default()
        };
        let mut timer = PomodoroTimer::new(&settings);
        run_phase(&mut timer, &settings, "2024-08-01T09:25:00+00:00");
        assert!(timer.is_running);
        assert_eq!(timer.started_at, Some(at("2024-08-01T09:25:00+00:00")));
    }

    #[test]
    fn stop_and_reset() {
        let settings = TimerSettings::default();
        let mut timer = PomodoroTimer::new(&settings);
        run_phase(&mut timer, &settings, "2024-08-01T09:25:00+00:00");
        assert_eq!(timer.session_type, SessionType::ShortBreak);

        timer.start(at("2024-08-01T09:26:00+00:00"), None).unwrap();
        timer.tick(100);
        timer.reset(&settings);
        assert_eq!(timer.current_time, 300);
        assert!(!timer.is_running);

        timer.stop(&settings);
        assert_eq!(timer.session_type, SessionType::Work);
        assert_eq!(timer.sessions_completed, 0);
        assert_eq!(timer.current_time, 1500);
    }

    #[test]
    fn work_length_change_applies_to_idle_work_phase() {
        let old = TimerSettings::default();
        let new = TimerSettings {
            work_duration: 50,
            ..TimerSettings::default()
        };

        let mut timer = PomodoroTimer::new(&old);
        timer.apply_settings(&old, &new);
        assert_eq!(timer.total_time, 3000);

        let mut running = PomodoroTimer::new(&old);
        running.start(at("2024-08-01T09:00:00+00:00"), None).unwrap();
        running.apply_settings(&old, &new);
        assert_eq!(running.total_time, 1500);
    }

    #[test]
    fn oversized_durations_saturate() {
        let old = TimerSettings::default();
        let huge = TimerSettings {
            work_duration: 100_000_000,
            short_break_duration: u32::MAX,
            ..TimerSettings::default()
        };

        let mut timer = PomodoroTimer::new(&huge);
        assert_eq!(timer.total_time, u32::MAX);

        timer.apply_settings(&old, &huge);
        assert_eq!(timer.current_time, u32::MAX);

        run_phase(&mut timer, &huge, "2024-08-01T09:25:00+00:00");
        assert_eq!(timer.session_type, SessionType::ShortBreak);
        assert_eq!(timer.total_time, u32::MAX);
    }
}
