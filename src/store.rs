// --------------------------------------------------
// JSON file store for tasks, sessions, settings and
// daily stats snapshots.
//
// Every write replaces the whole document: load, modify,
// write to a temp file, rename. A lock serializes writers
// so readers always see one complete snapshot.
// --------------------------------------------------

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, FixedOffset};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    DailyStats, DailyStatsPatch, Db, NewTask, PomodoroSession, SessionType, Task, TaskPatch,
};
use crate::window::{date_key, parse_date_key};

pub const DEFAULT_SNAPSHOT_LIMIT: usize = 30;

pub struct Store {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // A missing file is an empty document
    pub fn load(&self) -> AppResult<Db> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Db::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, db: &Db) -> AppResult<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(db)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Load, apply `f`, save. Nothing is written if `f` fails.
    pub fn update<T>(&self, f: impl FnOnce(&mut Db) -> AppResult<T>) -> AppResult<T> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::Internal("store lock poisoned".to_string()))?;

        let mut db = self.load()?;
        let out = f(&mut db)?;
        self.save(&db)?;
        Ok(out)
    }
}

fn task_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("task {id}"))
}

// Snapshots are keyed by the zero-padded form, so "2024-8-1" and
// "2024-08-01" land on the same entry.
fn require_date_key(date: &str) -> AppResult<String> {
    match parse_date_key(date) {
        Some(parsed) => Ok(date_key(parsed)),
        None => Err(AppError::Validation(format!("invalid date: {date}"))),
    }
}

impl Db {
    pub fn add_task(&mut self, input: NewTask, now: DateTime<FixedOffset>) -> AppResult<Task> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("title required".to_string()));
        }
        let estimated = input.estimated_pomodoros.unwrap_or(1);
        if estimated < 0 {
            return Err(AppError::Validation(
                "estimatedPomodoros must be >= 0".to_string(),
            ));
        }

        let task = Task {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            priority: input.priority.unwrap_or_default(),
            completed: false,
            created_at: now,
            completed_at: None,
            estimated_pomodoros: estimated,
            pomodoros_used: 0,
        };
        info!(task_id = %task.id, title = %task.title, "task created");
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn task(&self, id: Uuid) -> AppResult<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| task_not_found(id))
    }

    fn task_mut(&mut self, id: Uuid) -> AppResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| task_not_found(id))
    }

    pub fn update_task(&mut self, id: Uuid, patch: TaskPatch) -> AppResult<Task> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::Validation("title required".to_string()));
        }

        let t = self.task_mut(id)?;
        if let Some(title) = patch.title {
            t.title = title;
        }
        if patch.description.is_some() {
            t.description = patch.description;
        }
        if let Some(priority) = patch.priority {
            t.priority = priority;
        }
        if let Some(completed) = patch.completed {
            t.completed = completed;
        }
        if patch.completed_at.is_some() {
            t.completed_at = patch.completed_at;
        }
        if let Some(estimated) = patch.estimated_pomodoros {
            t.estimated_pomodoros = estimated;
        }
        if let Some(used) = patch.pomodoros_used {
            t.pomodoros_used = used;
        }

        info!(task_id = %id, "task updated");
        Ok(t.clone())
    }

    pub fn delete_task(&mut self, id: Uuid) -> AppResult<()> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Err(task_not_found(id));
        }
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Flip completion. Completing stamps `completedAt`, reopening clears it.
    pub fn toggle_task(&mut self, id: Uuid, now: DateTime<FixedOffset>) -> AppResult<Task> {
        let t = self.task_mut(id)?;
        t.completed = !t.completed;
        t.completed_at = t.completed.then_some(now);

        info!(task_id = %id, completed = t.completed, "task toggled");
        Ok(t.clone())
    }

    // Completed work sessions count toward their task's pomodorosUsed
    pub fn record_session(&mut self, session: PomodoroSession) -> PomodoroSession {
        if session.completed && session.session_type == SessionType::Work {
            if let Some(task) = session
                .task_id
                .and_then(|id| self.tasks.iter_mut().find(|t| t.id == id))
            {
                task.pomodoros_used = task.pomodoros_used.max(0) + 1;
            }
        }

        info!(
            session_id = %session.id,
            session_type = ?session.session_type,
            duration = session.duration,
            completed = session.completed,
            "session recorded"
        );
        self.sessions.push(session.clone());
        session
    }

    pub fn add_daily_stats(&mut self, mut stats: DailyStats) -> AppResult<DailyStats> {
        stats.date = require_date_key(&stats.date)?;
        info!(date = %stats.date, "daily snapshot added");
        self.daily.push(stats.clone());
        Ok(stats)
    }

    /// Overwrite the fields present in `patch` on the snapshot for `date`,
    /// starting from zeros when there is none yet.
    pub fn update_daily_stats(&mut self, date: &str, patch: DailyStatsPatch) -> AppResult<DailyStats> {
        let key = require_date_key(date)?;
        let entry = self.daily_entry(&key);

        if let Some(v) = patch.total_pomodoros {
            entry.total_pomodoros = v;
        }
        if let Some(v) = patch.work_time {
            entry.work_time = v;
        }
        if let Some(v) = patch.break_time {
            entry.break_time = v;
        }
        if let Some(v) = patch.tasks_completed {
            entry.tasks_completed = v;
        }
        if let Some(v) = patch.focus_score {
            entry.focus_score = v.min(100);
        }

        info!(date = %key, "daily snapshot updated");
        Ok(entry.clone())
    }

    /// Additive write for `date`: counters add to what is stored, a non-zero
    /// focus score replaces the stored one.
    pub fn merge_daily_snapshot(&mut self, date: &str, patch: DailyStatsPatch) -> AppResult<DailyStats> {
        let key = require_date_key(date)?;
        let entry = self.daily_entry(&key);

        entry.total_pomodoros = entry
            .total_pomodoros
            .saturating_add(patch.total_pomodoros.unwrap_or(0));
        entry.work_time = entry.work_time.saturating_add(patch.work_time.unwrap_or(0));
        entry.break_time = entry.break_time.saturating_add(patch.break_time.unwrap_or(0));
        entry.tasks_completed = entry
            .tasks_completed
            .saturating_add(patch.tasks_completed.unwrap_or(0));
        if let Some(score) = patch.focus_score.filter(|s| *s > 0) {
            entry.focus_score = score.min(100);
        }

        info!(date = %key, "daily snapshot merged");
        Ok(entry.clone())
    }

    fn daily_entry(&mut self, date: &str) -> &mut DailyStats {
        let idx = match self.daily.iter().position(|s| s.date == date) {
            Some(idx) => idx,
            None => {
                self.daily.push(DailyStats::empty(date));
                self.daily.len() - 1
            }
        };
        &mut self.daily[idx]
    }

    // Inclusive range on the date key, newest first
    pub fn daily_snapshots(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        limit: usize,
    ) -> Vec<DailyStats> {
        let mut out: Vec<DailyStats> = self
            .daily
            .iter()
            .filter(|s| start.is_none_or(|start| s.date.as_str() >= start))
            .filter(|s| end.is_none_or(|end| s.date.as_str() <= end))
            .cloned()
            .collect();

        out.sort_by(|a, b| b.date.cmp(&a.date));
        out.truncate(limit);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TimerSettings};
    use crate::testutil::{at, session};

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            priority: None,
            estimated_pomodoros: None,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("db.json"));
        let db = store.load().unwrap();
        assert!(db.tasks.is_empty());
        assert!(db.sessions.is_empty());
        assert_eq!(db.settings.work_duration, 25);
    }

    #[test]
    fn update_persists_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("nested").join("db.json"));

        let task = store
            .update(|db| db.add_task(new_task("essay"), at("2024-08-01T09:00:00+00:00")))
            .unwrap();

        let db = store.load().unwrap();
        assert_eq!(db.tasks.len(), 1);
        assert_eq!(db.tasks[0].id, task.id);
        assert!(!dir.path().join("nested").join("db.json.tmp").exists());
    }

    #[test]
    fn failed_update_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("db.json"));

        let result = store.update(|db| db.add_task(new_task("   "), at("2024-08-01T09:00:00+00:00")));
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(!store.path().exists());
    }

    #[test]
    fn documents_with_missing_collections_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"tasks": []}"#).unwrap();

        let db = Store::new(&path).load().unwrap();
        assert!(db.sessions.is_empty());
        assert!(db.daily.is_empty());
    }

    #[test]
    fn documents_with_null_collections_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(
            &path,
            r#"{"settings": null, "tasks": null, "sessions": null, "daily": null}"#,
        )
        .unwrap();

        let db = Store::new(&path).load().unwrap();
        assert!(db.tasks.is_empty());
        assert!(db.sessions.is_empty());
        assert!(db.daily.is_empty());
        assert_eq!(db.settings, TimerSettings::default());
    }

    #[test]
    fn new_task_defaults() {
        let mut db = Db::default();
        let task = db.add_task(new_task("essay"), at("2024-08-01T09:00:00+00:00")).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.estimated_pomodoros, 1);
        assert_eq!(task.pomodoros_used, 0);
        assert!(!task.completed);
    }

    #[test]
    fn toggle_sets_and_clears_completed_at() {
        let mut db = Db::default();
        let id = db.add_task(new_task("essay"), at("2024-08-01T09:00:00+00:00")).unwrap().id;

        let done = db.toggle_task(id, at("2024-08-01T11:00:00+00:00")).unwrap();
        assert!(done.completed);
        assert_eq!(done.completed_at, Some(at("2024-08-01T11:00:00+00:00")));

        let reopened = db.toggle_task(id, at("2024-08-01T12:00:00+00:00")).unwrap();
        assert!(!reopened.completed);
        assert_eq!(reopened.completed_at, None);
    }

    #[test]
    fn update_and_delete_unknown_task() {
        let mut db = Db::default();
        let id = Uuid::new_v4();
        assert!(matches!(
            db.update_task(id, TaskPatch::default()),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(db.delete_task(id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn update_task_is_shallow() {
        let mut db = Db::default();
        let id = db.add_task(new_task("essay"), at("2024-08-01T09:00:00+00:00")).unwrap().id;

        let patch = TaskPatch {
            priority: Some(Priority::High),
            estimated_pomodoros: Some(3),
            ..TaskPatch::default()
        };
        let t = db.update_task(id, patch).unwrap();
        assert_eq!(t.id, id);
        assert_eq!(t.title, "essay");
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.estimated_pomodoros, 3);
    }

    #[test]
    fn completed_work_session_bumps_task() {
        let mut db = Db::default();
        let id = db.add_task(new_task("essay"), at("2024-08-01T09:00:00+00:00")).unwrap().id;

        let mut work = session(SessionType::Work, 25, at("2024-08-01T09:00:00+00:00"), true);
        work.task_id = Some(id);
        let mut abandoned = work.clone();
        abandoned.id = Uuid::new_v4();
        abandoned.completed = false;

        db.record_session(work);
        db.record_session(abandoned);
        assert_eq!(db.task(id).unwrap().pomodoros_used, 1);
        assert_eq!(db.sessions.len(), 2);
    }

    #[test]
    fn merge_adds_counters() {
        let mut db = Db::default();
        let first = DailyStatsPatch {
            total_pomodoros: Some(2),
            work_time: Some(50),
            focus_score: Some(56),
            ..DailyStatsPatch::default()
        };
        db.merge_daily_snapshot("2024-08-01", first).unwrap();

        let second = DailyStatsPatch {
            total_pomodoros: Some(1),
            work_time: Some(25),
            break_time: Some(5),
            focus_score: Some(0),
            ..DailyStatsPatch::default()
        };
        let merged = db.merge_daily_snapshot("2024-08-01", second).unwrap();

        assert_eq!(merged.total_pomodoros, 3);
        assert_eq!(merged.work_time, 75);
        assert_eq!(merged.break_time, 5);
        assert_eq!(merged.focus_score, 56);
        assert_eq!(db.daily.len(), 1);
    }

    #[test]
    fn update_daily_stats_overwrites() {
        let mut db = Db::default();
        db.add_daily_stats(DailyStats {
            work_time: 100,
            tasks_completed: 4,
            ..DailyStats::empty("2024-08-01")
        })
        .unwrap();

        let patch = DailyStatsPatch {
            work_time: Some(25),
            ..DailyStatsPatch::default()
        };
        let s = db.update_daily_stats("2024-08-01", patch).unwrap();
        assert_eq!(s.work_time, 25);
        assert_eq!(s.tasks_completed, 4);

        let fresh = db
            .update_daily_stats("2024-08-02", DailyStatsPatch::default())
            .unwrap();
        assert_eq!(fresh, DailyStats::empty("2024-08-02"));
    }

    #[test]
    fn unpadded_dates_share_one_snapshot() {
        let mut db = Db::default();
        let patch = || DailyStatsPatch {
            work_time: Some(10),
            ..DailyStatsPatch::default()
        };

        let first = db.merge_daily_snapshot("2024-8-1", patch()).unwrap();
        assert_eq!(first.date, "2024-08-01");
        db.merge_daily_snapshot("2024-08-01", patch()).unwrap();
        db.update_daily_stats(" 2024-08-1", DailyStatsPatch {
            break_time: Some(5),
            ..DailyStatsPatch::default()
        })
        .unwrap();

        assert_eq!(db.daily.len(), 1);
        let found = db.daily_snapshots(Some("2024-08-01"), Some("2024-08-01"), 30);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].work_time, 20);
        assert_eq!(found[0].break_time, 5);

        let added = db.add_daily_stats(DailyStats::empty("2024-7-9")).unwrap();
        assert_eq!(added.date, "2024-07-09");
    }

    #[test]
    fn snapshot_writes_need_a_date() {
        let mut db = Db::default();
        assert!(db
            .merge_daily_snapshot("someday", DailyStatsPatch::default())
            .is_err());
        assert!(db.add_daily_stats(DailyStats::empty("")).is_err());
    }

    #[test]
    fn snapshots_filter_sort_and_limit() {
        let mut db = Db::default();
        for day in ["2024-08-03", "2024-07-30", "2024-08-01", "2024-08-05"] {
            db.add_daily_stats(DailyStats::empty(day)).unwrap();
        }

        let dates = |v: Vec<DailyStats>| v.into_iter().map(|s| s.date).collect::<Vec<_>>();

        assert_eq!(
            dates(db.daily_snapshots(Some("2024-08-01"), Some("2024-08-03"), 30)),
            vec!["2024-08-03", "2024-08-01"]
        );
        assert_eq!(
            dates(db.daily_snapshots(None, None, 2)),
            vec!["2024-08-05", "2024-08-03"]
        );
    }
}
