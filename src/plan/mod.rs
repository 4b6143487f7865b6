//! Workout plans and the ordering of their exercises
//!
//! Positions inside a plan are always the contiguous sequence `1..=N`.
//! Every mutation here renumbers; the store persists all positions after
//! each change (see `Database::save_plan_positions`).

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::exercises::Exercise;

/// Exercise slot inside a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExercise {
    /// Id of the slot itself, not of the exercise
    pub id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub position: u32,
    pub sets: u32,
    pub reps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub exercises: Vec<PlanExercise>,
}

/// Plan form input
#[derive(Debug, Clone, Default)]
pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl NewPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn normalized(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(Error::validation("plan name must not be empty"));
        }
        self.description = self.description.filter(|d| !d.trim().is_empty());
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

impl WorkoutPlan {
    /// Sort slots by position, ties by insertion (slot id)
    pub fn sort_exercises(&mut self) {
        self.exercises.sort_by_key(|e| (e.position, e.id));
    }

    pub fn exercise(&self, slot_id: i64) -> Option<&PlanExercise> {
        self.exercises.iter().find(|e| e.id == slot_id)
    }

    /// True when positions read 1, 2, ..., N in slot order
    pub fn positions_contiguous(&self) -> bool {
        self.exercises
            .iter()
            .enumerate()
            .all(|(i, e)| e.position as usize == i + 1)
    }
}

/// Assign positions `1..=N` following the current slot order
pub fn renumber(exercises: &mut [PlanExercise]) {
    for (i, slot) in exercises.iter_mut().enumerate() {
        slot.position = i as u32 + 1;
    }
}

/// Swap a slot with its neighbour and renumber.
///
/// Moving the first slot up, the last slot down, or an unknown slot returns
/// the plan unchanged.
pub fn move_exercise(mut plan: WorkoutPlan, slot_id: i64, direction: Direction) -> WorkoutPlan {
    let Some(index) = plan.exercises.iter().position(|e| e.id == slot_id) else {
        return plan;
    };
    let neighbour = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < plan.exercises.len() => index + 1,
        _ => return plan,
    };
    plan.exercises.swap(index, neighbour);
    renumber(&mut plan.exercises);
    plan
}

/// Slot for appending `exercise` at the end, seeded with its defaults.
///
/// `slot_id` is whatever the store assigned; callers that have not inserted
/// yet pass 0.
pub fn append_slot(plan: &mut WorkoutPlan, slot_id: i64, exercise: &Exercise) -> PlanExercise {
    let slot = PlanExercise {
        id: slot_id,
        exercise_id: exercise.id,
        exercise_name: exercise.name.clone(),
        position: plan.exercises.len() as u32 + 1,
        sets: exercise.default_sets.max(1),
        reps: exercise.default_reps.max(1),
    };
    plan.exercises.push(slot.clone());
    slot
}

/// Drop a slot and close the gap; `None` if the slot is not in the plan
pub fn remove_slot(mut plan: WorkoutPlan, slot_id: i64) -> Option<WorkoutPlan> {
    let index = plan.exercises.iter().position(|e| e.id == slot_id)?;
    plan.exercises.remove(index);
    renumber(&mut plan.exercises);
    Some(plan)
}

pub fn validate_targets(sets: u32, reps: u32) -> Result<()> {
    if sets == 0 || reps == 0 {
        return Err(Error::validation("sets and reps must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: i64, position: u32) -> PlanExercise {
        PlanExercise {
            id,
            exercise_id: id * 10,
            exercise_name: format!("exercise {}", id),
            position,
            sets: 3,
            reps: 10,
        }
    }

    fn create_plan(ids: &[i64]) -> WorkoutPlan {
        WorkoutPlan {
            id: 1,
            name: "Push".to_string(),
            description: None,
            image_url: None,
            created_at: Utc::now(),
            exercises: ids
                .iter()
                .enumerate()
                .map(|(i, id)| slot(*id, i as u32 + 1))
                .collect(),
        }
    }

    fn order(plan: &WorkoutPlan) -> Vec<i64> {
        plan.exercises.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_move_up_swaps_and_renumbers() {
        let plan = move_exercise(create_plan(&[1, 2, 3]), 3, Direction::Up);
        assert_eq!(order(&plan), vec![1, 3, 2]);
        assert!(plan.positions_contiguous());
    }

    #[test]
    fn test_move_down() {
        let plan = move_exercise(create_plan(&[1, 2, 3]), 1, Direction::Down);
        assert_eq!(order(&plan), vec![2, 1, 3]);
        assert_eq!(plan.exercises[0].position, 1);
        assert_eq!(plan.exercises[1].position, 2);
    }

    #[test]
    fn test_move_first_up_is_noop() {
        let original = create_plan(&[1, 2, 3]);
        let plan = move_exercise(original.clone(), 1, Direction::Up);
        assert_eq!(plan, original);
    }

    #[test]
    fn test_move_last_down_is_noop() {
        let original = create_plan(&[1, 2, 3]);
        let plan = move_exercise(original.clone(), 3, Direction::Down);
        assert_eq!(plan, original);
    }

    #[test]
    fn test_move_unknown_slot_is_noop() {
        let original = create_plan(&[1, 2]);
        assert_eq!(move_exercise(original.clone(), 99, Direction::Up), original);
    }

    #[test]
    fn test_sort_breaks_ties_by_insertion() {
        let mut plan = create_plan(&[]);
        plan.exercises = vec![slot(7, 2), slot(5, 1), slot(4, 2)];
        plan.sort_exercises();
        assert_eq!(order(&plan), vec![5, 4, 7]);
    }

    #[test]
    fn test_contiguity_after_mixed_operations() {
        let exercise = Exercise {
            id: 42,
            name: "Squat".to_string(),
            description: None,
            muscle_group: None,
            equipment: None,
            default_sets: 5,
            default_reps: 5,
            image_url: None,
        };

        let mut plan = create_plan(&[1, 2, 3, 4]);
        plan = remove_slot(plan, 2).unwrap();
        append_slot(&mut plan, 5, &exercise);
        plan = move_exercise(plan, 5, Direction::Up);
        plan = move_exercise(plan, 1, Direction::Down);
        plan = remove_slot(plan, 4).unwrap();
        append_slot(&mut plan, 6, &exercise);

        assert_eq!(order(&plan), vec![3, 1, 5, 6]);
        assert!(plan.positions_contiguous());
    }

    #[test]
    fn test_append_slot_uses_exercise_defaults() {
        let exercise = Exercise {
            id: 9,
            name: "Deadlift".to_string(),
            description: None,
            muscle_group: None,
            equipment: None,
            default_sets: 5,
            default_reps: 3,
            image_url: None,
        };
        let mut plan = create_plan(&[1]);
        let added = append_slot(&mut plan, 2, &exercise);

        assert_eq!(added.position, 2);
        assert_eq!((added.sets, added.reps), (5, 3));
        assert_eq!(added.exercise_name, "Deadlift");
    }

    #[test]
    fn test_remove_unknown_slot() {
        assert!(remove_slot(create_plan(&[1, 2]), 3).is_none());
    }

    #[test]
    fn test_new_plan_requires_name() {
        assert!(NewPlan::new("   ").normalized().is_err());
        assert_eq!(NewPlan::new(" Legs ").normalized().unwrap().name, "Legs");
    }
}
