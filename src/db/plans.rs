//! Workout plans and their exercise slots

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};
use tracing::{debug, info};

use super::Database;
use crate::error::{Error, Result};
use crate::plan::{self, Direction, NewPlan, PlanExercise, WorkoutPlan};

fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutPlan> {
    Ok(WorkoutPlan {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        image_url: row.get(3)?,
        created_at: row.get(4)?,
        exercises: Vec::new(),
    })
}

fn slot_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, PlanExercise)> {
    Ok((
        row.get(0)?,
        PlanExercise {
            id: row.get(1)?,
            exercise_id: row.get(2)?,
            exercise_name: row.get(3)?,
            position: row.get(4)?,
            sets: row.get(5)?,
            reps: row.get(6)?,
        },
    ))
}

const SLOT_QUERY: &str = "SELECT wpe.workout_plan_id, wpe.id, wpe.exercise_id, e.name, wpe.position, wpe.sets, wpe.reps
     FROM workout_plan_exercises wpe
     JOIN exercises e ON e.id = wpe.exercise_id";

impl Database {
    pub fn create_plan(&self, new: NewPlan) -> Result<WorkoutPlan> {
        let new = new.normalized()?;
        self.conn.execute(
            "INSERT INTO workout_plans (name, description, image_url, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![new.name, new.description, new.image_url, Utc::now()],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("Created plan {} (id {})", new.name, id);
        self.get_plan(id)
    }

    /// All plans in creation order (the rotation order), slots sorted
    pub fn get_plans(&self) -> Result<Vec<WorkoutPlan>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, image_url, created_at FROM workout_plans ORDER BY created_at, id",
        )?;
        let mut plans = stmt
            .query_map([], plan_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(SLOT_QUERY)?;
        let mut by_plan: HashMap<i64, Vec<PlanExercise>> = HashMap::new();
        for slot in stmt.query_map([], slot_from_row)? {
            let (plan_id, slot) = slot?;
            by_plan.entry(plan_id).or_default().push(slot);
        }

        for plan in &mut plans {
            plan.exercises = by_plan.remove(&plan.id).unwrap_or_default();
            plan.sort_exercises();
        }
        Ok(plans)
    }

    pub fn get_plan(&self, id: i64) -> Result<WorkoutPlan> {
        let mut plan = self
            .conn
            .query_row(
                "SELECT id, name, description, image_url, created_at FROM workout_plans WHERE id = ?1",
                params![id],
                plan_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found(format!("plan {}", id)))?;

        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE wpe.workout_plan_id = ?1", SLOT_QUERY))?;
        plan.exercises = stmt
            .query_map(params![id], slot_from_row)?
            .map(|r| r.map(|(_, slot)| slot))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        plan.sort_exercises();
        Ok(plan)
    }

    /// Case-insensitive name lookup; the oldest plan wins on duplicates
    pub fn find_plan_by_name(&self, name: &str) -> Result<Option<WorkoutPlan>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM workout_plans WHERE name = ?1 COLLATE NOCASE ORDER BY created_at, id LIMIT 1",
                params![name.trim()],
                |row| row.get(0),
            )
            .optional()?;
        id.map(|id| self.get_plan(id)).transpose()
    }

    /// Rename or re-describe a plan; its slots are untouched
    pub fn update_plan(&self, id: i64, new: NewPlan) -> Result<WorkoutPlan> {
        let new = new.normalized()?;
        let changed = self.conn.execute(
            "UPDATE workout_plans SET name = ?1, description = ?2, image_url = ?3 WHERE id = ?4",
            params![new.name, new.description, new.image_url, id],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("plan {}", id)));
        }
        info!("Updated plan {} (id {})", new.name, id);
        self.get_plan(id)
    }

    pub fn set_plan_image(&self, id: i64, image_url: Option<&str>) -> Result<()> {
        let changed = self
            .conn
            .execute("UPDATE workout_plans SET image_url = ?1 WHERE id = ?2", params![image_url, id])?;
        if changed == 0 {
            return Err(Error::not_found(format!("plan {}", id)));
        }
        Ok(())
    }

    /// Append an exercise at the end of a plan with its default targets
    pub fn add_plan_exercise(&self, plan_id: i64, exercise_id: i64) -> Result<PlanExercise> {
        let mut plan = self.get_plan(plan_id)?;
        let exercise = self.get_exercise(exercise_id)?;
        let slot = plan::append_slot(&mut plan, 0, &exercise);

        self.conn.execute(
            "INSERT INTO workout_plan_exercises (workout_plan_id, exercise_id, position, sets, reps)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![plan_id, slot.exercise_id, slot.position, slot.sets, slot.reps],
        )?;
        let slot = PlanExercise {
            id: self.conn.last_insert_rowid(),
            ..slot
        };
        info!("Added {} to plan {} at position {}", slot.exercise_name, plan.name, slot.position);
        Ok(slot)
    }

    pub fn remove_plan_exercise(&self, plan_id: i64, slot_id: i64) -> Result<WorkoutPlan> {
        let plan = self.get_plan(plan_id)?;
        let plan = plan::remove_slot(plan, slot_id)
            .ok_or_else(|| Error::not_found(format!("slot {} in plan {}", slot_id, plan_id)))?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM workout_plan_exercises WHERE id = ?1", params![slot_id])?;
        for slot in &plan.exercises {
            tx.execute(
                "UPDATE workout_plan_exercises SET position = ?1 WHERE id = ?2",
                params![slot.position, slot.id],
            )?;
        }
        tx.commit()?;
        info!("Removed slot {} from plan {}", slot_id, plan.name);
        Ok(plan)
    }

    pub fn update_plan_targets(&self, plan_id: i64, slot_id: i64, sets: u32, reps: u32) -> Result<()> {
        plan::validate_targets(sets, reps)?;
        let changed = self.conn.execute(
            "UPDATE workout_plan_exercises SET sets = ?1, reps = ?2 WHERE id = ?3 AND workout_plan_id = ?4",
            params![sets, reps, slot_id, plan_id],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("slot {} in plan {}", slot_id, plan_id)));
        }
        Ok(())
    }

    /// Persist every slot position of the plan in one transaction
    pub fn save_plan_positions(&self, plan: &WorkoutPlan) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for slot in &plan.exercises {
            tx.execute(
                "UPDATE workout_plan_exercises SET position = ?1 WHERE id = ?2 AND workout_plan_id = ?3",
                params![slot.position, slot.id, plan.id],
            )?;
        }
        tx.commit()?;
        debug!("Saved {} positions for plan {}", plan.exercises.len(), plan.id);
        Ok(())
    }

    /// Move a slot one step and persist the new order
    pub fn move_plan_exercise(&self, plan_id: i64, slot_id: i64, direction: Direction) -> Result<WorkoutPlan> {
        let plan = self.get_plan(plan_id)?;
        if plan.exercise(slot_id).is_none() {
            return Err(Error::not_found(format!("slot {} in plan {}", slot_id, plan_id)));
        }
        let moved = plan::move_exercise(plan, slot_id, direction);
        self.save_plan_positions(&moved)?;
        Ok(moved)
    }
}
