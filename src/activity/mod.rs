//! Daily activity log - one entry per calendar date
//!
//! Features:
//! - Plan rotation for the day (`rotation`)
//! - Upsert-by-date writer with payload fallback (`writer`)
//! - Current / longest streak reader (`streak`)

pub mod payload;
pub mod rotation;
pub mod streak;
pub mod writer;

pub use rotation::{DayContext, DayPlan, DaySnapshot, PlanSource, resolve_day_plan, select_rotation_plan};
pub use streak::{DayMark, DayStatus, Streak, compute_streak, week_strip};
pub use writer::{
    ActivityRow, ActivityStore, ExerciseInput, LogKind, LogRequest, PayloadField, SetInput, log_activity, parse_sets,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What happened on a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Workout { plan_id: i64 },
    Rest,
}

impl ActivityKind {
    pub fn is_rest(&self) -> bool {
        matches!(self, ActivityKind::Rest)
    }

    pub fn plan_id(&self) -> Option<i64> {
        match self {
            ActivityKind::Workout { plan_id } => Some(*plan_id),
            ActivityKind::Rest => None,
        }
    }
}

/// One performed set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetResult {
    /// 1-based
    pub set_number: u32,
    /// kg, never negative
    pub weight: f64,
    pub reps: u32,
}

/// Results for one exercise of a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub exercise_id: i64,
    pub exercise_name: String,
    pub sets: Vec<SetResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExerciseResult {
    /// Total weight moved (weight x reps over all sets)
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(|s| s.weight * f64::from(s.reps)).sum()
    }
}

/// Stored activity for one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub kind: ActivityKind,
    /// Human-entered notes only; never contains an embedded payload
    pub notes: String,
    pub exercises: Vec<ExerciseResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accessors() {
        let workout = ActivityKind::Workout { plan_id: 4 };
        assert_eq!(workout.plan_id(), Some(4));
        assert!(!workout.is_rest());
        assert_eq!(ActivityKind::Rest.plan_id(), None);
        assert!(ActivityKind::Rest.is_rest());
    }

    #[test]
    fn test_volume() {
        let result = ExerciseResult {
            exercise_id: 1,
            exercise_name: "Bench Press".to_string(),
            sets: vec![
                SetResult { set_number: 1, weight: 40.0, reps: 10 },
                SetResult { set_number: 2, weight: 50.0, reps: 8 },
            ],
            notes: None,
        };
        assert_eq!(result.volume(), 800.0);
    }
}
