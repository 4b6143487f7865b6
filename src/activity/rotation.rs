//! Which plan is due on a given day
//!
//! The rotation is stateless: the number of activities logged before the
//! day picks the plan, so every logged session advances it by one.

use chrono::NaiveDate;
use tracing::warn;

use super::{ActivityKind, ActivityLogEntry};
use crate::plan::WorkoutPlan;

/// `plans[logged_count % plans.len()]`, or `None` without plans
pub fn select_rotation_plan(logged_count: u64, plans: &[WorkoutPlan]) -> Option<&WorkoutPlan> {
    if plans.is_empty() {
        return None;
    }
    let index = (logged_count % plans.len() as u64) as usize;
    plans.get(index)
}

/// Why a plan was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    /// The day already has a logged workout
    Logged,
    /// The user picked a different plan for the day
    Override,
    Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayPlan<'a> {
    Workout { plan: &'a WorkoutPlan, source: PlanSource },
    /// The day is logged as a rest day
    Rest,
    /// Nothing logged and no plans to rotate through
    NoPlans,
}

impl<'a> DayPlan<'a> {
    pub fn plan(&self) -> Option<&'a WorkoutPlan> {
        match *self {
            DayPlan::Workout { plan, .. } => Some(plan),
            _ => None,
        }
    }
}

/// Inputs for resolving one day
#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    /// Rotation order (creation order)
    pub plans: &'a [WorkoutPlan],
    /// Activities counted for the rotation, dated before the day
    pub prior_count: u64,
    pub existing: Option<&'a ActivityLogEntry>,
    pub override_plan_id: Option<i64>,
}

/// Owned inputs for one day, as loaded from the store
#[derive(Debug, Clone)]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub plans: Vec<WorkoutPlan>,
    pub prior_count: u64,
    pub existing: Option<ActivityLogEntry>,
    pub override_plan_id: Option<i64>,
}

impl DaySnapshot {
    pub fn context(&self) -> DayContext<'_> {
        DayContext {
            plans: &self.plans,
            prior_count: self.prior_count,
            existing: self.existing.as_ref(),
            override_plan_id: self.override_plan_id,
        }
    }

    pub fn resolve(&self) -> DayPlan<'_> {
        resolve_day_plan(&self.context())
    }
}

fn find_plan(plans: &[WorkoutPlan], id: i64) -> Option<&WorkoutPlan> {
    plans.iter().find(|p| p.id == id)
}

/// Existing log, then override, then rotation
pub fn resolve_day_plan<'a>(ctx: &DayContext<'a>) -> DayPlan<'a> {
    if let Some(entry) = ctx.existing {
        match entry.kind {
            ActivityKind::Rest => return DayPlan::Rest,
            ActivityKind::Workout { plan_id } => match find_plan(ctx.plans, plan_id) {
                Some(plan) => return DayPlan::Workout { plan, source: PlanSource::Logged },
                None => warn!("Entry {} references missing plan {}", entry.id, plan_id),
            },
        }
    }

    if let Some(id) = ctx.override_plan_id {
        match find_plan(ctx.plans, id) {
            Some(plan) => return DayPlan::Workout { plan, source: PlanSource::Override },
            None => warn!("Override references missing plan {}", id),
        }
    }

    match select_rotation_plan(ctx.prior_count, ctx.plans) {
        Some(plan) => DayPlan::Workout { plan, source: PlanSource::Rotation },
        None => DayPlan::NoPlans,
    }
}
