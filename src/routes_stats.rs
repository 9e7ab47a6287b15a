use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::format::week_labels;
use crate::models::{DailyStats, DailyStatsPatch, MonthlyStats, WeeklyStats};
use crate::stats::{self, Period, PeriodSummary};
use crate::store::DEFAULT_SNAPSHOT_LIMIT;
use crate::window::{date_key, local_day, local_now, parse_date_key};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>, // "YYYY-MM-DD", today when absent
}

impl DateQuery {
    fn key(&self) -> String {
        match &self.date {
            Some(date) => date.clone(),
            None => date_key(local_day(&local_now())),
        }
    }

    // Window anchors must parse
    fn anchor(&self) -> AppResult<NaiveDate> {
        match &self.date {
            None => Ok(local_day(&local_now())),
            Some(date) => parse_date_key(date)
                .ok_or_else(|| AppError::BadRequest(format!("invalid date: {date}"))),
        }
    }
}

// -----------------------------
// GET /api/stats/today
// -----------------------------
pub async fn get_today(State(state): State<AppState>) -> AppResult<Json<DailyStats>> {
    let db = state.store.load()?;
    Ok(Json(stats::today_stats(&db.tasks, &db.sessions, local_now())))
}

// -----------------------------
// GET /api/stats/daily?date=
// Unparsable dates give an all-zero record
// -----------------------------
pub async fn get_daily(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> AppResult<Json<DailyStats>> {
    let db = state.store.load()?;
    Ok(Json(stats::calculate_daily_stats(&db.tasks, &db.sessions, &q.key())))
}

// -----------------------------
// GET /api/stats/hourly?date=
// Sparse hour -> minutes map
// -----------------------------
pub async fn get_hourly(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> AppResult<Json<BTreeMap<u32, u64>>> {
    let db = state.store.load()?;
    Ok(Json(stats::hourly_focus_distribution(&q.key(), &db.sessions)))
}

// -----------------------------
// GET /api/stats/weekly?date=
// -----------------------------
pub async fn get_weekly(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> AppResult<Json<WeeklyStats>> {
    let anchor = q.anchor()?;
    let db = state.store.load()?;
    Ok(Json(stats::weekly_stats(anchor, &db.tasks, &db.sessions)))
}

// -----------------------------
// GET /api/stats/monthly?date=
// -----------------------------
pub async fn get_monthly(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> AppResult<Json<MonthlyStats>> {
    let anchor = q.anchor()?;
    let db = state.store.load()?;
    Ok(Json(stats::monthly_stats(anchor, &db.tasks, &db.sessions)))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub view: Period,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: PeriodSummary,
    pub labels: Vec<String>, // week view only
}

// -----------------------------
// GET /api/stats/summary?view=week|month&date=
// -----------------------------
pub async fn get_summary(
    State(state): State<AppState>,
    Query(q): Query<SummaryQuery>,
) -> AppResult<Json<SummaryResponse>> {
    let anchor = DateQuery { date: q.date }.anchor()?;
    let db = state.store.load()?;

    let window = stats::period_stats(q.view, anchor, &db.tasks, &db.sessions);
    let labels = match q.view {
        Period::Week => week_labels(q.view.window(anchor).0),
        Period::Month => Vec::new(),
    };

    Ok(Json(SummaryResponse {
        summary: PeriodSummary::from_window(q.view, &window),
        labels,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

// -----------------------------
// GET /api/stats?startDate=&endDate=&limit=
// Stored snapshots, newest first
// -----------------------------
pub async fn get_snapshots(
    State(state): State<AppState>,
    Query(q): Query<SnapshotQuery>,
) -> AppResult<Json<Vec<DailyStats>>> {
    let db = state.store.load()?;
    Ok(Json(db.daily_snapshots(
        q.start_date.as_deref(),
        q.end_date.as_deref(),
        q.limit.unwrap_or(DEFAULT_SNAPSHOT_LIMIT),
    )))
}

#[derive(Debug, Deserialize)]
pub struct SnapshotInput {
    pub date: String,
    #[serde(flatten)]
    pub patch: DailyStatsPatch,
}

// -----------------------------
// POST /api/stats
// Additive merge into the snapshot for `date`
// -----------------------------
pub async fn post_snapshot(
    State(state): State<AppState>,
    Json(input): Json<SnapshotInput>,
) -> AppResult<(StatusCode, Json<DailyStats>)> {
    let merged = state
        .store
        .update(|db| db.merge_daily_snapshot(&input.date, input.patch))?;
    Ok((StatusCode::CREATED, Json(merged)))
}

// -----------------------------
// PUT /api/stats/:date
// Overwrite the given fields
// -----------------------------
pub async fn put_snapshot(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(patch): Json<DailyStatsPatch>,
) -> AppResult<Json<DailyStats>> {
    let updated = state.store.update(|db| db.update_daily_stats(&date, patch))?;
    Ok(Json(updated))
}

// -----------------------------
// POST /api/stats/sync?date=
// Replace the stored snapshot with freshly computed stats
// -----------------------------
pub async fn sync_snapshot(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> AppResult<Json<DailyStats>> {
    let anchor = q.anchor()?;
    let synced = state.store.update(|db| {
        let fresh = stats::daily_stats(&db.tasks, &db.sessions, anchor);
        db.update_daily_stats(&fresh.date, DailyStatsPatch::from(&fresh))
    })?;
    Ok(Json(synced))
}
