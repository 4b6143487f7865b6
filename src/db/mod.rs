//! Database module - SQLite storage for exercises, plans and the activity log

mod activity;
mod measurements;
mod plans;

use std::cell::Cell;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::exercises::{Exercise, NewExercise};

/// What the opened schema supports.
///
/// Probed at open and after `migrate`; a column that disappears while the
/// database is open downgrades it on first contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `activity_log.exercise_details` exists
    pub structured_payload: bool,
}

/// Database wrapper
pub struct Database {
    conn: Connection,
    capabilities: Cell<Capabilities>,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS exercises (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        description TEXT,
        muscle_group TEXT,
        equipment TEXT,
        default_sets INTEGER NOT NULL DEFAULT 3,
        default_reps INTEGER NOT NULL DEFAULT 10,
        image_url TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS workout_plans (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        image_url TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS workout_plan_exercises (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        workout_plan_id INTEGER NOT NULL REFERENCES workout_plans(id) ON DELETE CASCADE,
        exercise_id INTEGER NOT NULL REFERENCES exercises(id),
        position INTEGER NOT NULL,
        sets INTEGER NOT NULL,
        reps INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS activity_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        logged_on TEXT NOT NULL,
        is_rest_day INTEGER NOT NULL DEFAULT 0,
        workout_plan_id INTEGER REFERENCES workout_plans(id),
        notes TEXT NOT NULL DEFAULT '',
        exercise_details TEXT,
        CHECK (is_rest_day = 1 OR workout_plan_id IS NOT NULL)
    );

    CREATE TABLE IF NOT EXISTS rotation_overrides (
        override_on TEXT PRIMARY KEY,
        workout_plan_id INTEGER NOT NULL REFERENCES workout_plans(id)
    );

    CREATE TABLE IF NOT EXISTS body_stats (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        stat_date TEXT NOT NULL,
        weight REAL,
        body_fat REAL,
        muscle_mass REAL,
        created_at TEXT NOT NULL
    );
";

/// Optional columns added by `migrate` on older databases
const OPTIONAL_COLUMNS: &[(&str, &str, &str)] = &[
    ("activity_log", "exercise_details", "TEXT"),
    ("exercises", "image_url", "TEXT"),
    ("workout_plans", "image_url", "TEXT"),
];

/// Turn "no such column" failures into `Error::MissingColumn`
pub(crate) fn map_missing_column(err: rusqlite::Error, table: &str, column: &str) -> Error {
    let msg = err.to_string();
    if msg.contains(column) && (msg.contains("no such column") || msg.contains("has no column named")) {
        Error::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    } else {
        Error::Storage(err)
    }
}

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        muscle_group: row.get(3)?,
        equipment: row.get(4)?,
        default_sets: row.get(5)?,
        default_reps: row.get(6)?,
        image_url: row.get(7)?,
    })
}

const EXERCISE_COLUMNS: &str =
    "id, name, description, muscle_group, equipment, default_sets, default_reps, image_url";

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        info!("Opening database at {}", path);
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub(crate) fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self {
            conn,
            capabilities: Cell::new(Capabilities { structured_payload: false }),
        };
        db.init_schema()?;
        db.capabilities.set(db.probe_capabilities()?);
        if !db.capabilities().structured_payload {
            warn!("activity_log has no exercise_details column; results will be kept in notes (run `db migrate`)");
        }
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;

        // Backstop for the one-entry-per-day rule; older databases may
        // already hold duplicates
        if let Err(e) = self.conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_activity_log_day ON activity_log(logged_on)",
            [],
        ) {
            warn!("Could not enforce one activity per day at the storage layer: {}", e);
        }
        Ok(())
    }

    fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names.iter().any(|n| n == column))
    }

    fn probe_capabilities(&self) -> Result<Capabilities> {
        let caps = Capabilities {
            structured_payload: self.has_column("activity_log", "exercise_details")?,
        };
        debug!("Schema capabilities: {:?}", caps);
        Ok(caps)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities.get()
    }

    /// Stop using `exercise_details` once the schema reports it missing
    pub(crate) fn forget_payload_column(&self, err: &Error) {
        if err.is_missing_column() && self.capabilities.get().structured_payload {
            warn!("exercise_details is gone ({}); keeping results in notes from now on", err);
            self.capabilities.set(Capabilities { structured_payload: false });
        }
    }

    /// Add missing optional columns; returns the `table.column` names added
    pub fn migrate(&mut self) -> Result<Vec<String>> {
        let mut added = Vec::new();
        for (table, column, ty) in OPTIONAL_COLUMNS {
            if !self.has_column(table, column)? {
                self.conn
                    .execute(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, ty), [])?;
                info!("Added column {}.{}", table, column);
                added.push(format!("{}.{}", table, column));
            }
        }
        self.capabilities.set(self.probe_capabilities()?);
        Ok(added)
    }

    /// Row counts per table, for `db info`
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        let tables = [
            "exercises",
            "workout_plans",
            "workout_plan_exercises",
            "activity_log",
            "rotation_overrides",
            "body_stats",
        ];
        tables
            .into_iter()
            .map(|t| -> Result<(&'static str, i64)> {
                let count: i64 = self
                    .conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", t), [], |row| row.get(0))?;
                Ok((t, count))
            })
            .collect()
    }

    /// Add new exercise
    pub fn add_exercise(&self, exercise: NewExercise) -> Result<Exercise> {
        let ex = exercise.normalized()?;
        if self.find_exercise_by_name(&ex.name)?.is_some() {
            return Err(Error::validation(format!("exercise '{}' already exists", ex.name)));
        }
        self.conn.execute(
            "INSERT INTO exercises (name, description, muscle_group, equipment, default_sets, default_reps, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                ex.name,
                ex.description,
                ex.muscle_group,
                ex.equipment,
                ex.default_sets,
                ex.default_reps,
                ex.image_url,
                Utc::now(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("Added exercise {} (id {})", ex.name, id);
        self.get_exercise(id)
    }

    /// Replace an exercise's details; names stay unique ignoring case
    pub fn update_exercise(&self, id: i64, exercise: NewExercise) -> Result<Exercise> {
        let ex = exercise.normalized()?;
        if let Some(other) = self.find_exercise_by_name(&ex.name)?
            && other.id != id
        {
            return Err(Error::validation(format!("exercise '{}' already exists", ex.name)));
        }
        let changed = self.conn.execute(
            "UPDATE exercises
             SET name = ?1, description = ?2, muscle_group = ?3, equipment = ?4,
                 default_sets = ?5, default_reps = ?6, image_url = ?7
             WHERE id = ?8",
            params![
                ex.name,
                ex.description,
                ex.muscle_group,
                ex.equipment,
                ex.default_sets,
                ex.default_reps,
                ex.image_url,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("exercise {}", id)));
        }
        info!("Updated exercise {} (id {})", ex.name, id);
        self.get_exercise(id)
    }

    /// All exercises by name, optionally filtered by muscle group
    pub fn get_exercises(&self, muscle_group: Option<&str>) -> Result<Vec<Exercise>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM exercises WHERE (?1 IS NULL OR muscle_group = ?1 COLLATE NOCASE) ORDER BY name",
            EXERCISE_COLUMNS
        ))?;
        let exercises = stmt
            .query_map(params![muscle_group], exercise_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(exercises)
    }

    pub fn get_exercise(&self, id: i64) -> Result<Exercise> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM exercises WHERE id = ?1", EXERCISE_COLUMNS),
                params![id],
                exercise_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found(format!("exercise {}", id)))
    }

    /// Case-insensitive exact name lookup
    pub fn find_exercise_by_name(&self, name: &str) -> Result<Option<Exercise>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM exercises WHERE name = ?1 COLLATE NOCASE", EXERCISE_COLUMNS),
                params![name.trim()],
                exercise_from_row,
            )
            .optional()?)
    }

    pub fn set_exercise_image(&self, id: i64, image_url: Option<&str>) -> Result<()> {
        let changed = self
            .conn
            .execute("UPDATE exercises SET image_url = ?1 WHERE id = ?2", params![image_url, id])?;
        if changed == 0 {
            return Err(Error::not_found(format!("exercise {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_has_structured_payload() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.capabilities().structured_payload);
    }

    #[test]
    fn test_legacy_schema_detected_and_migrated() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE activity_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                logged_on TEXT NOT NULL,
                is_rest_day INTEGER NOT NULL DEFAULT 0,
                workout_plan_id INTEGER,
                notes TEXT NOT NULL DEFAULT ''
            );",
        )
        .unwrap();

        let mut db = Database::from_connection(conn).unwrap();
        assert!(!db.capabilities().structured_payload);

        let added = db.migrate().unwrap();
        assert_eq!(added, vec!["activity_log.exercise_details".to_string()]);
        assert!(db.capabilities().structured_payload);
        assert!(db.migrate().unwrap().is_empty());
    }

    #[test]
    fn test_add_and_find_exercise() {
        let db = Database::open_in_memory().unwrap();
        let mut new = NewExercise::new("Bench Press");
        new.muscle_group = Some("pecs".to_string());
        new.equipment = Some("bb".to_string());
        let ex = db.add_exercise(new).unwrap();

        assert_eq!(ex.muscle_group.as_deref(), Some("Chest"));
        assert_eq!(ex.equipment.as_deref(), Some("Barbell"));
        assert_eq!((ex.default_sets, ex.default_reps), (3, 10));

        let found = db.find_exercise_by_name("bench press").unwrap().unwrap();
        assert_eq!(found.id, ex.id);
    }

    #[test]
    fn test_duplicate_exercise_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.add_exercise(NewExercise::new("Squat")).unwrap();
        let err = db.add_exercise(NewExercise::new("squat")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_filter_by_muscle_group() {
        let db = Database::open_in_memory().unwrap();
        let mut bench = NewExercise::new("Bench Press");
        bench.muscle_group = Some("Chest".to_string());
        let mut squat = NewExercise::new("Squat");
        squat.muscle_group = Some("Quads".to_string());
        db.add_exercise(bench).unwrap();
        db.add_exercise(squat).unwrap();

        let chest = db.get_exercises(Some("chest")).unwrap();
        assert_eq!(chest.len(), 1);
        assert_eq!(chest[0].name, "Bench Press");
        assert_eq!(db.get_exercises(None).unwrap().len(), 2);
    }

    #[test]
    fn test_update_exercise() {
        let db = Database::open_in_memory().unwrap();
        let ex = db.add_exercise(NewExercise::new("Bench")).unwrap();

        let mut edit = NewExercise::new(" Bench Press ");
        edit.muscle_group = Some("pecs".to_string());
        edit.equipment = Some("bb".to_string());
        edit.default_sets = 4;
        edit.default_reps = 6;
        edit.description = Some("Flat bench".to_string());
        let updated = db.update_exercise(ex.id, edit).unwrap();

        assert_eq!(updated.id, ex.id);
        assert_eq!(updated.name, "Bench Press");
        assert_eq!(updated.muscle_group.as_deref(), Some("Chest"));
        assert_eq!(updated.equipment.as_deref(), Some("Barbell"));
        assert_eq!((updated.default_sets, updated.default_reps), (4, 6));
        assert_eq!(db.get_exercise(ex.id).unwrap(), updated);
    }

    #[test]
    fn test_update_exercise_keeps_own_name_and_rejects_others() {
        let db = Database::open_in_memory().unwrap();
        let squat = db.add_exercise(NewExercise::new("Squat")).unwrap();
        db.add_exercise(NewExercise::new("Deadlift")).unwrap();

        // Re-casing its own name is fine
        assert_eq!(db.update_exercise(squat.id, NewExercise::new("SQUAT")).unwrap().name, "SQUAT");

        let err = db.update_exercise(squat.id, NewExercise::new("deadlift")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = db.update_exercise(squat.id, NewExercise::new("  ")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(db.get_exercise(squat.id).unwrap().name, "SQUAT");

        let err = db.update_exercise(999, NewExercise::new("Lunge")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_set_exercise_image() {
        let db = Database::open_in_memory().unwrap();
        let ex = db.add_exercise(NewExercise::new("Dips")).unwrap();
        db.set_exercise_image(ex.id, Some("https://img.example/dips.png")).unwrap();

        let ex = db.get_exercise(ex.id).unwrap();
        assert_eq!(ex.image_url.as_deref(), Some("https://img.example/dips.png"));
        assert!(db.set_exercise_image(999, None).is_err());
    }

    #[test]
    fn test_table_counts() {
        let db = Database::open_in_memory().unwrap();
        db.add_exercise(NewExercise::new("Dips")).unwrap();
        let counts = db.table_counts().unwrap();
        assert!(counts.contains(&("exercises", 1)));
        assert!(counts.contains(&("activity_log", 0)));
    }
}
