//! Activity log rows and per-day rotation overrides

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row, params};
use tracing::{debug, info, warn};

use super::{Capabilities, Database, map_missing_column};
use crate::activity::{
    ActivityKind, ActivityLogEntry, ActivityRow, ActivityStore, DaySnapshot, ExerciseResult, PayloadField, payload,
};
use crate::config::{CountPolicy, day_bounds};
use crate::error::{Error, Result};

/// Raw columns of one `activity_log` row
struct StoredActivity {
    id: i64,
    date: NaiveDate,
    is_rest_day: bool,
    plan_id: Option<i64>,
    notes: String,
    details: Option<String>,
}

impl StoredActivity {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            date: row.get(1)?,
            is_rest_day: row.get(2)?,
            plan_id: row.get(3)?,
            notes: row.get(4)?,
            details: row.get(5)?,
        })
    }

    /// A non-NULL `exercise_details` is authoritative and the notes are read
    /// verbatim; otherwise the notes may carry an embedded payload
    fn into_entry(self) -> ActivityLogEntry {
        let kind = match (self.is_rest_day, self.plan_id) {
            (false, Some(plan_id)) => ActivityKind::Workout { plan_id },
            (false, None) => {
                warn!("Activity {} has no plan; reading it as a rest day", self.id);
                ActivityKind::Rest
            }
            (true, _) => ActivityKind::Rest,
        };

        let (notes, exercises): (String, Vec<ExerciseResult>) = match self.details {
            Some(details) => {
                let exercises = if details.trim().is_empty() {
                    Vec::new()
                } else {
                    payload::from_json(&details).unwrap_or_else(|e| {
                        warn!("Activity {} has unreadable exercise details: {}", self.id, e);
                        Vec::new()
                    })
                };
                (self.notes, exercises)
            }
            None => {
                let (notes, embedded) = payload::split_embedded(&self.notes);
                (notes, embedded.unwrap_or_default())
            }
        };

        ActivityLogEntry {
            id: self.id,
            date: self.date,
            kind,
            notes,
            exercises,
        }
    }
}

impl Database {
    fn activity_select(&self, structured: bool) -> String {
        let details = if structured { "exercise_details" } else { "NULL" };
        format!(
            "SELECT id, logged_on, is_rest_day, workout_plan_id, notes, {} FROM activity_log",
            details
        )
    }

    fn select_activities(
        &self,
        structured: bool,
        filter: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> rusqlite::Result<Vec<StoredActivity>> {
        let sql = format!("{} {}", self.activity_select(structured), filter);
        debug!("Activity query: {}", sql);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(args, StoredActivity::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Rows for `filter`, falling back to a select without `exercise_details`
    /// if the column vanished since it was probed
    fn query_activities(&self, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<ActivityLogEntry>> {
        let structured = self.capabilities().structured_payload;
        let rows = match self
            .select_activities(structured, filter, args)
            .map_err(|e| map_missing_column(e, "activity_log", "exercise_details"))
        {
            Err(e) if structured && e.is_missing_column() => {
                self.forget_payload_column(&e);
                self.select_activities(false, filter, args)?
            }
            other => other?,
        };
        Ok(rows.into_iter().map(StoredActivity::into_entry).collect())
    }

    /// Whole log, newest first
    pub fn get_activities(&self) -> Result<Vec<ActivityLogEntry>> {
        self.query_activities("ORDER BY logged_on DESC, id DESC", &[])
    }

    /// Entries dated within `[start, end)`, oldest first
    pub fn get_activities_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ActivityLogEntry>> {
        self.query_activities(
            "WHERE logged_on >= ?1 AND logged_on < ?2 ORDER BY logged_on, id",
            params![start, end],
        )
    }

    pub fn get_activity_for_date(&self, date: NaiveDate) -> Result<Option<ActivityLogEntry>> {
        let (start, end) = day_bounds(date).ok_or_else(|| Error::validation(format!("date {} is out of range", date)))?;
        self.find_activity_between(start, end)
    }

    /// Entries dated strictly before `date` that advance the rotation
    pub fn count_activities_before(&self, date: NaiveDate, policy: CountPolicy) -> Result<u64> {
        let sql = match policy {
            CountPolicy::Workouts => "SELECT COUNT(*) FROM activity_log WHERE logged_on < ?1 AND is_rest_day = 0",
            CountPolicy::All => "SELECT COUNT(*) FROM activity_log WHERE logged_on < ?1",
        };
        let count: i64 = self.conn.query_row(sql, params![date], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Pick a plan for one day instead of the rotation
    pub fn set_override(&self, date: NaiveDate, plan_id: i64) -> Result<()> {
        let plan = self.get_plan(plan_id)?;
        self.conn.execute(
            "INSERT INTO rotation_overrides (override_on, workout_plan_id) VALUES (?1, ?2)
             ON CONFLICT(override_on) DO UPDATE SET workout_plan_id = excluded.workout_plan_id",
            params![date, plan_id],
        )?;
        info!("Override for {}: {}", date, plan.name);
        Ok(())
    }

    /// Returns whether an override was removed
    pub fn clear_override(&self, date: NaiveDate) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM rotation_overrides WHERE override_on = ?1", params![date])?;
        Ok(removed > 0)
    }

    pub fn get_override(&self, date: NaiveDate) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT workout_plan_id FROM rotation_overrides WHERE override_on = ?1",
                params![date],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn payload_write_error(&self, err: rusqlite::Error) -> Error {
        let err = map_missing_column(err, "activity_log", "exercise_details");
        self.forget_payload_column(&err);
        err
    }

    /// Everything needed to decide what is due on `date`
    pub fn day_snapshot(&self, date: NaiveDate, policy: CountPolicy) -> Result<DaySnapshot> {
        Ok(DaySnapshot {
            date,
            plans: self.get_plans()?,
            prior_count: self.count_activities_before(date, policy)?,
            existing: self.get_activity_for_date(date)?,
            override_plan_id: self.get_override(date)?,
        })
    }
}

impl ActivityStore for Database {
    fn capabilities(&self) -> Capabilities {
        Database::capabilities(self)
    }

    fn find_activity_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Option<ActivityLogEntry>> {
        let rows = self.query_activities(
            "WHERE logged_on >= ?1 AND logged_on < ?2 ORDER BY id LIMIT 1",
            params![start, end],
        )?;
        Ok(rows.into_iter().next())
    }

    fn insert_activity(&self, row: &ActivityRow) -> Result<i64> {
        let is_rest = row.kind.is_rest();
        let plan_id = row.kind.plan_id();
        match &row.details {
            PayloadField::Column(details) => self
                .conn
                .execute(
                    "INSERT INTO activity_log (logged_on, is_rest_day, workout_plan_id, notes, exercise_details)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![row.date, is_rest, plan_id, row.notes, details],
                )
                .map_err(|e| self.payload_write_error(e))?,
            PayloadField::Embedded => self.conn.execute(
                "INSERT INTO activity_log (logged_on, is_rest_day, workout_plan_id, notes) VALUES (?1, ?2, ?3, ?4)",
                params![row.date, is_rest, plan_id, row.notes],
            )?,
        };
        Ok(self.conn.last_insert_rowid())
    }

    fn update_activity(&self, id: i64, row: &ActivityRow) -> Result<()> {
        let is_rest = row.kind.is_rest();
        let plan_id = row.kind.plan_id();
        let changed = match &row.details {
            PayloadField::Column(details) => self
                .conn
                .execute(
                    "UPDATE activity_log
                     SET logged_on = ?1, is_rest_day = ?2, workout_plan_id = ?3, notes = ?4, exercise_details = ?5
                     WHERE id = ?6",
                    params![row.date, is_rest, plan_id, row.notes, details, id],
                )
                .map_err(|e| self.payload_write_error(e))?,
            PayloadField::Embedded => self.conn.execute(
                "UPDATE activity_log SET logged_on = ?1, is_rest_day = ?2, workout_plan_id = ?3, notes = ?4
                 WHERE id = ?5",
                params![row.date, is_rest, plan_id, row.notes, id],
            )?,
        };
        if changed == 0 {
            return Err(Error::not_found(format!("activity {}", id)));
        }
        Ok(())
    }
}
