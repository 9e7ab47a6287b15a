// --------------------------------------------------
// Timer control, session log and timer settings.
//
// The timer lives in memory; finished phases are
// written to the store as sessions.
// -------------------------------------------------

use std::sync::MutexGuard;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::format::format_clock;
use crate::models::{NewSession, PomodoroSession, TimerSettings, MAX_PHASE_MINUTES};
use crate::timer::PomodoroTimer;
use crate::window::{local_now, parse_date_key, sessions_on};
use crate::AppState;

fn lock_timer(state: &AppState) -> AppResult<MutexGuard<'_, PomodoroTimer>> {
    state
        .timer
        .lock()
        .map_err(|_| AppError::Internal("timer lock poisoned".to_string()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    #[serde(flatten)]
    pub timer: PomodoroTimer,
    pub display: String, // "MM:SS"
    pub progress: f64,   // 0.0..=1.0
}

impl From<&PomodoroTimer> for TimerView {
    fn from(timer: &PomodoroTimer) -> Self {
        Self {
            timer: timer.clone(),
            display: format_clock(timer.current_time),
            progress: timer.progress(),
        }
    }
}

// -----------------------------
// GET /api/timer
// -----------------------------
pub async fn get_timer(State(state): State<AppState>) -> AppResult<Json<TimerView>> {
    let timer = lock_timer(&state)?;
    Ok(Json(TimerView::from(&*timer)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInput {
    pub task_id: Option<Uuid>,
}

// -----------------------------
// POST /api/timer/start
// Optional body: { "taskId": ... }
// -----------------------------
pub async fn start_timer(
    State(state): State<AppState>,
    input: Option<Json<StartInput>>,
) -> AppResult<Json<TimerView>> {
    let task_id = input.and_then(|Json(i)| i.task_id);
    let mut timer = lock_timer(&state)?;
    timer.start(local_now(), task_id)?;
    Ok(Json(TimerView::from(&*timer)))
}

// -----------------------------
// POST /api/timer/pause
// -----------------------------
pub async fn pause_timer(State(state): State<AppState>) -> AppResult<Json<TimerView>> {
    let mut timer = lock_timer(&state)?;
    timer.pause()?;
    Ok(Json(TimerView::from(&*timer)))
}

#[derive(Debug, Deserialize)]
pub struct TickInput {
    pub seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct TickResponse {
    #[serde(flatten)]
    pub view: TimerView,
    pub finished: bool, // phase reached zero; call complete next
}

// -----------------------------
// POST /api/timer/tick
// Body: { "seconds": n } elapsed since the last tick
// -----------------------------
pub async fn tick_timer(
    State(state): State<AppState>,
    Json(input): Json<TickInput>,
) -> AppResult<Json<TickResponse>> {
    let mut timer = lock_timer(&state)?;
    let finished = timer.tick(input.seconds);
    Ok(Json(TickResponse {
        view: TimerView::from(&*timer),
        finished,
    }))
}

// -----------------------------
// POST /api/timer/stop
// -----------------------------
pub async fn stop_timer(State(state): State<AppState>) -> AppResult<Json<TimerView>> {
    let settings = state.store.load()?.settings;
    let mut timer = lock_timer(&state)?;
    timer.stop(&settings);
    Ok(Json(TimerView::from(&*timer)))
}

// -----------------------------
// POST /api/timer/reset
// -----------------------------
pub async fn reset_timer(State(state): State<AppState>) -> AppResult<Json<TimerView>> {
    let settings = state.store.load()?.settings;
    let mut timer = lock_timer(&state)?;
    timer.reset(&settings);
    Ok(Json(TimerView::from(&*timer)))
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub session: PomodoroSession,
    pub timer: TimerView,
}

// -----------------------------
// POST /api/timer/complete
// Records the finished phase, then advances the timer
// -----------------------------
pub async fn complete_timer(State(state): State<AppState>) -> AppResult<Json<CompleteResponse>> {
    let settings = state.store.load()?.settings;
    let mut timer = lock_timer(&state)?;

    // advance a copy so a failed write leaves the timer untouched
    let mut next = timer.clone();
    let finished = next.complete(&settings, local_now())?;
    let session = state.store.update(|db| Ok(db.record_session(finished)))?;
    *timer = next;

    Ok(Json(CompleteResponse {
        session,
        timer: TimerView::from(&*timer),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    pub date: Option<String>,
}

// -----------------------------
// GET /api/sessions?date=
// All sessions, or those started on `date`
// -----------------------------
pub async fn get_sessions(
    State(state): State<AppState>,
    Query(q): Query<SessionsQuery>,
) -> AppResult<Json<Vec<PomodoroSession>>> {
    let db = state.store.load()?;
    let Some(key) = q.date else {
        return Ok(Json(db.sessions));
    };
    let date = parse_date_key(&key)
        .ok_or_else(|| AppError::BadRequest(format!("invalid date: {key}")))?;

    Ok(Json(sessions_on(&db.sessions, date).into_iter().cloned().collect()))
}

// -----------------------------
// POST /api/sessions
// Log a session finished outside the server timer
// -----------------------------
pub async fn create_session(
    State(state): State<AppState>,
    Json(input): Json<NewSession>,
) -> AppResult<(StatusCode, Json<PomodoroSession>)> {
    let session = state
        .store
        .update(|db| Ok(db.record_session(input.into_session())))?;
    Ok((StatusCode::CREATED, Json(session)))
}

// -----------------------------
// GET /api/settings
// -----------------------------
pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<TimerSettings>> {
    Ok(Json(state.store.load()?.settings))
}

fn validate_settings(settings: &TimerSettings) -> AppResult<()> {
    if settings.work_duration == 0 || settings.long_break_interval == 0 {
        return Err(AppError::Validation(
            "workDuration and longBreakInterval must be positive".to_string(),
        ));
    }
    let longest = settings
        .work_duration
        .max(settings.short_break_duration)
        .max(settings.long_break_duration);
    if longest > MAX_PHASE_MINUTES {
        return Err(AppError::Validation(format!(
            "durations must be at most {MAX_PHASE_MINUTES} minutes"
        )));
    }
    Ok(())
}

// -----------------------------
// PUT /api/settings
// -----------------------------
pub async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<TimerSettings>,
) -> AppResult<Json<TimerSettings>> {
    validate_settings(&settings)?;

    let previous = state.store.update(|db| {
        Ok(std::mem::replace(&mut db.settings, settings.clone()))
    })?;
    lock_timer(&state)?.apply_settings(&previous, &settings);

    Ok(Json(settings))
}
