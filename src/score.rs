/*
Focus score heuristic.
Independent from storage and HTTP so it can be tested directly.
The constants are fixed: stored snapshots were scored with them.
*/

use crate::models::{PomodoroSession, Task};

const POINTS_PER_SESSION: f64 = 15.0;
const SESSION_CAP: f64 = 60.0;
const POINTS_PER_TASK: f64 = 20.0;
const TASK_CAP: f64 = 40.0;
const EFFICIENCY_BONUS_SCALE: f64 = 30.0;
const EFFICIENCY_BONUS_PIVOT: f64 = 1.2;
const EFFICIENCY_BONUS_CAP: f64 = 30.0;
const OVERRUN_PENALTY_SCALE: f64 = 10.0;
const OVERRUN_PENALTY_CAP: f64 = 10.0;

// Ratio of pomodoros used to pomodoros estimated across the given tasks.
//
// None when there are no tasks or nothing was estimated.
// Negative counts are treated as 0.
pub fn estimate_efficiency(completed_tasks: &[&Task]) -> Option<f64> {
    if completed_tasks.is_empty() {
        return None;
    }

    let estimated: i64 = completed_tasks
        .iter()
        .map(|t| t.estimated_pomodoros.max(0))
        .sum();
    let used: i64 = completed_tasks.iter().map(|t| t.pomodoros_used.max(0)).sum();

    if estimated <= 0 {
        return None;
    }
    Some(used as f64 / estimated as f64)
}

/// Score a day's focus from 0 to 100.
///
/// Components:
/// - 15 per completed work session, at most 60
/// - 20 per completed task, at most 40
/// - efficiency <= 1.0: bonus of 30 * (1.2 - efficiency), at most 30
/// - efficiency > 1.0: penalty of 10 * (efficiency - 1.0), at most 10
///
/// The sum is clamped to 0..=100 and rounded. No activity at all scores 0.
pub fn focus_score(completed_tasks: &[&Task], work_sessions: &[&PomodoroSession]) -> u32 {
    if completed_tasks.is_empty() && work_sessions.is_empty() {
        return 0;
    }

    let mut score = (work_sessions.len() as f64 * POINTS_PER_SESSION).min(SESSION_CAP);
    score += (completed_tasks.len() as f64 * POINTS_PER_TASK).min(TASK_CAP);

    if let Some(efficiency) = estimate_efficiency(completed_tasks) {
        if efficiency <= 1.0 {
            score += (EFFICIENCY_BONUS_SCALE * (EFFICIENCY_BONUS_PIVOT - efficiency))
                .min(EFFICIENCY_BONUS_CAP);
        } else {
            score -= (OVERRUN_PENALTY_SCALE * (efficiency - 1.0)).min(OVERRUN_PENALTY_CAP);
        }
    }

    score.clamp(0.0, 100.0).round() as u32
}
