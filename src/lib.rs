// Define data modules
pub mod config; // Environment configuration
pub mod error; // Error types and HTTP error responses
pub mod format; // Display formatting for durations and counts
pub mod models; // Data structures (Task, PomodoroSession, DailyStats, Db, etc.)
pub mod routes_stats; // HTTP handlers for statistics and snapshots
pub mod routes_tasks; // HTTP handlers for task APIs
pub mod routes_timer; // HTTP handlers for timer, sessions and settings
pub mod score; // Focus score heuristic
pub mod stats; // Daily / hourly / weekly / monthly aggregation
pub mod store; // Persistent storage (load/save db.json)
pub mod timer; // Work / break cycle state machine
pub mod window; // Calendar windows and per-day filtering

#[cfg(test)]
mod testutil;

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::AppResult;
use crate::store::Store;
use crate::timer::PomodoroTimer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub timer: Arc<Mutex<PomodoroTimer>>,
}

impl AppState {
    // The timer starts idle, sized from the stored settings
    pub fn new(store: Store) -> AppResult<Self> {
        let settings = store.load()?.settings;
        Ok(Self {
            store: Arc::new(store),
            timer: Arc::new(Mutex::new(PomodoroTimer::new(&settings))),
        })
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // tasks
        .route("/tasks", get(routes_tasks::get_tasks).post(routes_tasks::create_task))
        .route(
            "/tasks/:id",
            get(routes_tasks::get_task)
                .put(routes_tasks::update_task)
                .delete(routes_tasks::delete_task),
        )
        .route("/tasks/:id/toggle", post(routes_tasks::toggle_task))
        // sessions
        .route(
            "/sessions",
            get(routes_timer::get_sessions).post(routes_timer::create_session),
        )
        // stats
        .route(
            "/stats",
            get(routes_stats::get_snapshots).post(routes_stats::post_snapshot),
        )
        .route("/stats/today", get(routes_stats::get_today))
        .route("/stats/daily", get(routes_stats::get_daily))
        .route("/stats/hourly", get(routes_stats::get_hourly))
        .route("/stats/weekly", get(routes_stats::get_weekly))
        .route("/stats/monthly", get(routes_stats::get_monthly))
        .route("/stats/summary", get(routes_stats::get_summary))
        .route("/stats/sync", post(routes_stats::sync_snapshot))
        .route("/stats/:date", put(routes_stats::put_snapshot))
        // timer
        .route("/timer", get(routes_timer::get_timer))
        .route("/timer/start", post(routes_timer::start_timer))
        .route("/timer/pause", post(routes_timer::pause_timer))
        .route("/timer/tick", post(routes_timer::tick_timer))
        .route("/timer/stop", post(routes_timer::stop_timer))
        .route("/timer/reset", post(routes_timer::reset_timer))
        .route("/timer/complete", post(routes_timer::complete_timer))
        // settings
        .route(
            "/settings",
            get(routes_timer::get_settings).put(routes_timer::put_settings),
        )
}

pub fn app(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .nest("/api", api_router())
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
