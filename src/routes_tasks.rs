// --------------------------------------------------
// Handles API endpoints related to task CRUD operations.
//
// Responsibilities:
// - Create / read / update / delete tasks
// - Toggle completion (stamps or clears completedAt)
// -------------------------------------------------

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewTask, Task, TaskPatch};
use crate::window::local_now;
use crate::AppState;

pub(crate) fn parse_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest(format!("invalid id: {id}")))
}

#[derive(Debug, Deserialize)]
pub struct TasksQuery {
    pub completed: Option<bool>,
}

// -----------------------------
// GET /api/tasks?completed=
// All tasks, optionally only (un)completed ones
// -----------------------------
pub async fn get_tasks(
    State(state): State<AppState>,
    Query(q): Query<TasksQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let db = state.store.load()?;
    let tasks = db
        .tasks
        .into_iter()
        .filter(|t| q.completed.is_none_or(|c| t.completed == c))
        .collect();
    Ok(Json(tasks))
}

// -----------------------------
// POST /api/tasks
// -----------------------------
pub async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<NewTask>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let now = local_now();
    let task = state.store.update(|db| db.add_task(input, now))?;
    Ok((StatusCode::CREATED, Json(task)))
}

// -----------------------------
// GET /api/tasks/:id
// -----------------------------
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let id = parse_id(&id)?;
    let db = state.store.load()?;
    Ok(Json(db.task(id)?.clone()))
}

// -----------------------------
// PUT /api/tasks/:id
// Shallow update; the id never changes
// -----------------------------
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> AppResult<Json<Task>> {
    let id = parse_id(&id)?;
    let task = state.store.update(|db| db.update_task(id, patch))?;
    Ok(Json(task))
}

// -----------------------------
// DELETE /api/tasks/:id
// -----------------------------
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let id = parse_id(&id)?;
    state.store.update(|db| db.delete_task(id))?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// -----------------------------
// POST /api/tasks/:id/toggle
// -----------------------------
pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let id = parse_id(&id)?;
    let now = local_now();
    let task = state.store.update(|db| db.toggle_task(id, now))?;
    Ok(Json(task))
}
