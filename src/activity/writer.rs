//! Activity log writer
//!
//! Saving twice for the same date updates the first entry in place; the
//! second save wins. The store reports whether it has a structured payload
//! column. A structured write that still hits a missing
//! column is retried exactly once with the payload embedded in the notes.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::{ActivityKind, ActivityLogEntry, ExerciseResult, SetResult, payload};
use crate::config::day_bounds;
use crate::db::Capabilities;
use crate::error::{Error, Result};
use crate::plan::WorkoutPlan;

/// Where the serialized results go on write
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadField {
    /// Write the `exercise_details` column (`[]` for a rest day)
    Column(String),
    /// Payload already embedded in `notes`; leave the column alone
    Embedded,
}

/// Storage representation of an entry
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub date: NaiveDate,
    pub kind: ActivityKind,
    pub notes: String,
    pub details: PayloadField,
}

/// The writer's view of the backing store
pub trait ActivityStore {
    fn capabilities(&self) -> Capabilities;

    /// First entry dated within `[start, end)`
    fn find_activity_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Option<ActivityLogEntry>>;

    fn insert_activity(&self, row: &ActivityRow) -> Result<i64>;

    fn update_activity(&self, id: i64, row: &ActivityRow) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetInput {
    pub weight: f64,
    pub reps: u32,
}

/// Entered results for one exercise
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseInput {
    pub exercise_id: i64,
    pub exercise_name: String,
    pub sets: Vec<SetInput>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum LogKind<'a> {
    Workout(&'a WorkoutPlan),
    Rest,
}

#[derive(Debug, Clone)]
pub struct LogRequest<'a> {
    pub date: NaiveDate,
    pub kind: LogKind<'a>,
    pub inputs: Vec<ExerciseInput>,
    pub notes: String,
}

impl<'a> LogRequest<'a> {
    pub fn workout(date: NaiveDate, plan: &'a WorkoutPlan) -> Self {
        Self {
            date,
            kind: LogKind::Workout(plan),
            inputs: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn rest(date: NaiveDate) -> Self {
        Self {
            date,
            kind: LogKind::Rest,
            inputs: Vec::new(),
            notes: String::new(),
        }
    }
}

/// Parse sets like `60x10 62.5x8`; a bare number is reps at 0 kg.
///
/// Sets are separated by whitespace (a trailing comma is allowed). A comma
/// inside a weight is a decimal comma: `62,5x8` is 62.5 kg.
pub fn parse_sets(text: &str) -> Option<Vec<SetInput>> {
    let sets = text
        .split_whitespace()
        .map(|t| t.trim_end_matches(','))
        .filter(|t| !t.is_empty())
        .map(|token| {
            let token = token.to_lowercase().replace('*', "x");
            let (weight, reps) = match token.split_once('x') {
                Some((w, r)) => (
                    w.replace("kg", "").replace(',', ".").parse::<f64>().ok()?,
                    r.parse::<u32>().ok()?,
                ),
                None => (0.0, token.parse::<u32>().ok()?),
            };
            (weight.is_finite() && weight >= 0.0 && reps > 0).then_some(SetInput { weight, reps })
        })
        .collect::<Option<Vec<_>>>()?;
    (!sets.is_empty()).then_some(sets)
}

fn to_result(input: ExerciseInput) -> Result<ExerciseResult> {
    let mut sets = Vec::with_capacity(input.sets.len());
    for (i, set) in input.sets.iter().enumerate() {
        if !set.weight.is_finite() || set.weight < 0.0 {
            return Err(Error::validation(format!(
                "{} set {}: weight must be a non-negative number",
                input.exercise_name,
                i + 1
            )));
        }
        sets.push(SetResult {
            set_number: i as u32 + 1,
            weight: set.weight,
            reps: set.reps,
        });
    }
    Ok(ExerciseResult {
        exercise_id: input.exercise_id,
        exercise_name: input.exercise_name,
        sets,
        notes: input.notes.filter(|n| !n.trim().is_empty()),
    })
}

/// Results for every plan exercise, in plan order.
///
/// Plan exercises without input are zero-filled: `sets` copies of the
/// target reps at 0 kg. Inputs for exercises outside the plan follow.
pub fn build_payload(plan: &WorkoutPlan, inputs: Vec<ExerciseInput>) -> Result<Vec<ExerciseResult>> {
    let mut pending: Vec<Option<ExerciseInput>> = inputs.into_iter().map(Some).collect();
    let mut payload = Vec::with_capacity(plan.exercises.len() + pending.len());

    for slot in &plan.exercises {
        let input = pending
            .iter_mut()
            .find(|i| matches!(i, Some(input) if input.exercise_id == slot.exercise_id))
            .and_then(Option::take);

        match input {
            Some(input) => payload.push(to_result(input)?),
            None => {
                debug!("Zero-filling {} ({}x{})", slot.exercise_name, slot.sets, slot.reps);
                payload.push(ExerciseResult {
                    exercise_id: slot.exercise_id,
                    exercise_name: slot.exercise_name.clone(),
                    sets: (1..=slot.sets)
                        .map(|n| SetResult { set_number: n, weight: 0.0, reps: slot.reps })
                        .collect(),
                    notes: None,
                });
            }
        }
    }

    for extra in pending.into_iter().flatten() {
        payload.push(to_result(extra)?);
    }

    if payload.is_empty() {
        return Err(Error::validation(format!("plan '{}' has no exercises to log", plan.name)));
    }
    Ok(payload)
}

fn encode_row(
    date: NaiveDate,
    kind: ActivityKind,
    notes: &str,
    results: &[ExerciseResult],
    structured: bool,
) -> Result<ActivityRow> {
    let (notes, details) = if structured {
        (notes.to_string(), PayloadField::Column(payload::to_json(results)?))
    } else {
        (payload::embed(notes, results)?, PayloadField::Embedded)
    };
    Ok(ActivityRow { date, kind, notes, details })
}

fn write_row<S: ActivityStore + ?Sized>(store: &S, existing: Option<i64>, row: &ActivityRow) -> Result<i64> {
    match existing {
        Some(id) => {
            store.update_activity(id, row)?;
            Ok(id)
        }
        None => store.insert_activity(row),
    }
}

/// Record a workout or rest day, updating the date's entry if there is one
pub fn log_activity<S: ActivityStore + ?Sized>(store: &S, request: LogRequest<'_>) -> Result<ActivityLogEntry> {
    let LogRequest { date, kind, inputs, notes } = request;
    let (start, end) = day_bounds(date).ok_or_else(|| Error::validation(format!("date {} is out of range", date)))?;

    let (kind, results) = match kind {
        LogKind::Workout(plan) => (ActivityKind::Workout { plan_id: plan.id }, build_payload(plan, inputs)?),
        LogKind::Rest => {
            if !inputs.is_empty() {
                debug!("Ignoring {} exercise inputs for rest day {}", inputs.len(), date);
            }
            (ActivityKind::Rest, Vec::new())
        }
    };

    let existing = store.find_activity_between(start, end)?.map(|e| e.id);
    let structured = store.capabilities().structured_payload;

    let row = encode_row(date, kind, &notes, &results, structured)?;
    let id = match write_row(store, existing, &row) {
        Err(e) if structured && e.is_missing_column() => {
            warn!("Structured payload rejected ({}), retrying with notes fallback", e);
            let fallback = encode_row(date, kind, &notes, &results, false)?;
            write_row(store, existing, &fallback)?
        }
        other => other?,
    };

    info!(
        "{} {} for {} (id {})",
        if existing.is_some() { "Updated" } else { "Logged" },
        if kind.is_rest() { "rest day" } else { "workout" },
        date,
        id
    );

    Ok(ActivityLogEntry {
        id,
        date,
        kind,
        notes,
        exercises: results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanExercise;
    use chrono::Utc;
    use std::cell::{Cell, RefCell};

    /// In-memory store; `reject_column_writes` simulates a dropped column
    struct FakeStore {
        structured: bool,
        reject_column_writes: Cell<u32>,
        rows: RefCell<Vec<(i64, ActivityRow)>>,
    }

    impl FakeStore {
        fn new(structured: bool) -> Self {
            Self {
                structured,
                reject_column_writes: Cell::new(0),
                rows: RefCell::new(Vec::new()),
            }
        }

        fn rows_on(&self, date: NaiveDate) -> Vec<ActivityRow> {
            self.rows
                .borrow()
                .iter()
                .filter(|(_, r)| r.date == date)
                .map(|(_, r)| r.clone())
                .collect()
        }

        fn check_column(&self, row: &ActivityRow) -> Result<()> {
            if matches!(row.details, PayloadField::Column(_)) && self.reject_column_writes.get() > 0 {
                self.reject_column_writes.set(self.reject_column_writes.get() - 1);
                return Err(Error::MissingColumn {
                    table: "activity_log".to_string(),
                    column: "exercise_details".to_string(),
                });
            }
            Ok(())
        }
    }

    impl ActivityStore for FakeStore {
        fn capabilities(&self) -> Capabilities {
            Capabilities { structured_payload: self.structured }
        }

        fn find_activity_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Option<ActivityLogEntry>> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .find(|(_, r)| r.date >= start && r.date < end)
                .map(|(id, r)| ActivityLogEntry {
                    id: *id,
                    date: r.date,
                    kind: r.kind,
                    notes: r.notes.clone(),
                    exercises: Vec::new(),
                }))
        }

        fn insert_activity(&self, row: &ActivityRow) -> Result<i64> {
            self.check_column(row)?;
            let mut rows = self.rows.borrow_mut();
            let id = rows.len() as i64 + 1;
            rows.push((id, row.clone()));
            Ok(id)
        }

        fn update_activity(&self, id: i64, row: &ActivityRow) -> Result<()> {
            self.check_column(row)?;
            let mut rows = self.rows.borrow_mut();
            let slot = rows
                .iter_mut()
                .find(|(row_id, _)| *row_id == id)
                .ok_or_else(|| Error::not_found(format!("activity {}", id)))?;
            slot.1 = row.clone();
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_plan(id: i64, exercises: &[(i64, &str, u32, u32)]) -> WorkoutPlan {
        WorkoutPlan {
            id,
            name: format!("plan {}", id),
            description: None,
            image_url: None,
            created_at: Utc::now(),
            exercises: exercises
                .iter()
                .enumerate()
                .map(|(i, (ex_id, name, sets, reps))| PlanExercise {
                    id: 100 + i as i64,
                    exercise_id: *ex_id,
                    exercise_name: name.to_string(),
                    position: i as u32 + 1,
                    sets: *sets,
                    reps: *reps,
                })
                .collect(),
        }
    }

    fn bench_input(sets: usize, weight: f64, reps: u32) -> ExerciseInput {
        ExerciseInput {
            exercise_id: 1,
            exercise_name: "Bench Press".to_string(),
            sets: vec![SetInput { weight, reps }; sets],
            notes: None,
        }
    }

    #[test]
    fn test_same_day_relog_updates_in_place() {
        let store = FakeStore::new(true);
        let plan_a = create_plan(1, &[(1, "Bench Press", 3, 10)]);
        let plan_b = create_plan(2, &[(2, "Squat", 5, 5)]);
        let day = date(2024, 6, 1);

        let mut first = LogRequest::workout(day, &plan_a);
        first.inputs = vec![bench_input(3, 40.0, 10)];
        let first = log_activity(&store, first).unwrap();

        let second = log_activity(&store, LogRequest::workout(day, &plan_b)).unwrap();

        assert_eq!(first.id, second.id);
        let rows = store.rows_on(day);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, ActivityKind::Workout { plan_id: 2 });
    }

    #[test]
    fn test_distinct_days_get_distinct_entries() {
        let store = FakeStore::new(true);
        let plan = create_plan(1, &[(1, "Bench Press", 3, 10)]);

        let a = log_activity(&store, LogRequest::workout(date(2024, 6, 1), &plan)).unwrap();
        let b = log_activity(&store, LogRequest::rest(date(2024, 6, 2))).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.rows.borrow().len(), 2);
    }

    #[test]
    fn test_zero_fill_missing_exercises() {
        let plan = create_plan(1, &[(1, "Bench Press", 3, 10), (2, "Dips", 2, 12)]);
        let payload = build_payload(&plan, vec![bench_input(1, 60.0, 5)]).unwrap();

        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].sets.len(), 1);
        assert_eq!(payload[0].sets[0].weight, 60.0);
        assert_eq!(payload[1].exercise_name, "Dips");
        assert_eq!(
            payload[1].sets,
            vec![
                SetResult { set_number: 1, weight: 0.0, reps: 12 },
                SetResult { set_number: 2, weight: 0.0, reps: 12 },
            ]
        );
    }

    #[test]
    fn test_extra_inputs_follow_plan_order() {
        let plan = create_plan(1, &[(2, "Dips", 1, 12)]);
        let payload = build_payload(&plan, vec![bench_input(2, 40.0, 10)]).unwrap();

        assert_eq!(payload[0].exercise_id, 2);
        assert_eq!(payload[1].exercise_id, 1);
        assert_eq!(payload[1].sets[1].set_number, 2);
    }

    #[test]
    fn test_negative_weight_rejected_before_store() {
        let store = FakeStore::new(true);
        let plan = create_plan(1, &[(1, "Bench Press", 3, 10)]);
        let mut request = LogRequest::workout(date(2024, 6, 1), &plan);
        request.inputs = vec![bench_input(1, -5.0, 10)];

        let err = log_activity(&store, request).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.rows.borrow().is_empty());
    }

    #[test]
    fn test_nan_weight_rejected() {
        let plan = create_plan(1, &[(1, "Bench Press", 3, 10)]);
        assert!(build_payload(&plan, vec![bench_input(1, f64::NAN, 10)]).is_err());
    }

    #[test]
    fn test_empty_plan_rejected() {
        let plan = create_plan(1, &[]);
        let err = build_payload(&plan, Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_structured_store_keeps_notes_clean() {
        let store = FakeStore::new(true);
        let plan = create_plan(1, &[(1, "Bench Press", 3, 10)]);
        let mut request = LogRequest::workout(date(2024, 6, 1), &plan);
        request.notes = "good session".to_string();
        log_activity(&store, request).unwrap();

        let row = &store.rows_on(date(2024, 6, 1))[0];
        assert_eq!(row.notes, "good session");
        assert!(matches!(&row.details, PayloadField::Column(json) if json.contains("Bench Press")));
    }

    #[test]
    fn test_legacy_store_embeds_payload() {
        let store = FakeStore::new(false);
        let plan = create_plan(1, &[(1, "Bench Press", 3, 10)]);
        let mut request = LogRequest::workout(date(2024, 6, 1), &plan);
        request.notes = "legacy".to_string();
        let entry = log_activity(&store, request).unwrap();

        let row = &store.rows_on(date(2024, 6, 1))[0];
        assert_eq!(row.details, PayloadField::Embedded);
        let (notes, payload) = payload::split_embedded(&row.notes);
        assert_eq!(notes, "legacy");
        assert_eq!(payload.unwrap(), entry.exercises);
    }

    #[test]
    fn test_missing_column_retried_once_with_fallback() {
        let store = FakeStore::new(true);
        store.reject_column_writes.set(1);
        let plan = create_plan(1, &[(1, "Bench Press", 3, 10)]);

        let entry = log_activity(&store, LogRequest::workout(date(2024, 6, 1), &plan)).unwrap();

        let row = &store.rows_on(date(2024, 6, 1))[0];
        assert_eq!(row.details, PayloadField::Embedded);
        assert_eq!(payload::split_embedded(&row.notes).1.unwrap(), entry.exercises);
    }

    #[test]
    fn test_rest_day_writes_empty_structured_payload() {
        let store = FakeStore::new(true);
        let plan = create_plan(1, &[(1, "Bench Press", 3, 10)]);
        let day = date(2024, 6, 1);
        log_activity(&store, LogRequest::workout(day, &plan)).unwrap();

        let entry = log_activity(&store, LogRequest::rest(day)).unwrap();

        assert!(entry.exercises.is_empty());
        let rows = store.rows_on(day);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, ActivityKind::Rest);
        assert_eq!(rows[0].details, PayloadField::Column("[]".to_string()));
    }

    #[test]
    fn test_parse_sets() {
        let sets = parse_sets("60x10 62.5x8, 65kgx6").unwrap();
        assert_eq!(
            sets,
            vec![
                SetInput { weight: 60.0, reps: 10 },
                SetInput { weight: 62.5, reps: 8 },
                SetInput { weight: 65.0, reps: 6 },
            ]
        );
    }

    #[test]
    fn test_parse_bodyweight_reps() {
        assert_eq!(
            parse_sets("12 10").unwrap(),
            vec![SetInput { weight: 0.0, reps: 12 }, SetInput { weight: 0.0, reps: 10 }]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_sets("").is_none());
        assert!(parse_sets("heavy").is_none());
        assert!(parse_sets("60x0").is_none());
        assert!(parse_sets("-5x10").is_none());
    }

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_sets("62,5x8").unwrap(), vec![SetInput { weight: 62.5, reps: 8 }]);
        assert_eq!(
            parse_sets("60x10, 62,5kgx8").unwrap(),
            vec![SetInput { weight: 60.0, reps: 10 }, SetInput { weight: 62.5, reps: 8 }]
        );
        // A comma between two bare numbers is ambiguous
        assert!(parse_sets("62,5").is_none());
        assert!(parse_sets("60x10,62x8").is_none());
    }
}
