//! Personal records per exercise

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::activity::ActivityLogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Heaviest set; more reps then the earlier date break ties
    Weight,
    /// Most reps in one set; heavier weight then the earlier date break ties
    Reps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonalRecord {
    pub exercise_id: i64,
    pub exercise_name: String,
    pub kind: RecordKind,
    pub weight: f64,
    pub reps: u32,
    pub achieved_on: NaiveDate,
}

impl PersonalRecord {
    pub fn value_label(&self) -> String {
        match self.kind {
            RecordKind::Weight => format!("{} kg x {}", self.weight, self.reps),
            RecordKind::Reps => format!("{} reps @ {} kg", self.reps, self.weight),
        }
    }
}

fn better(kind: RecordKind, candidate: &PersonalRecord, current: &PersonalRecord) -> bool {
    let primary = match kind {
        RecordKind::Weight => candidate
            .weight
            .partial_cmp(&current.weight)
            .unwrap_or(Ordering::Equal)
            .then(candidate.reps.cmp(&current.reps)),
        RecordKind::Reps => candidate
            .reps
            .cmp(&current.reps)
            .then(candidate.weight.partial_cmp(&current.weight).unwrap_or(Ordering::Equal)),
    };
    match primary {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => candidate.achieved_on < current.achieved_on,
    }
}

/// Best weight and best reps for every exercise with logged sets.
///
/// Zero-weight sets (bodyweight or untouched defaults) never set a weight
/// record. `filter` keeps exercises whose name contains it, ignoring case.
/// Sorted by exercise name, weight record first.
pub fn personal_records(entries: &[ActivityLogEntry], filter: Option<&str>) -> Vec<PersonalRecord> {
    let filter = filter.map(|f| f.trim().to_lowercase()).filter(|f| !f.is_empty());
    let mut best: BTreeMap<(String, i64), [Option<PersonalRecord>; 2]> = BTreeMap::new();

    for entry in entries {
        for result in &entry.exercises {
            if let Some(f) = &filter {
                if !result.exercise_name.to_lowercase().contains(f) {
                    continue;
                }
            }
            let slots = best
                .entry((result.exercise_name.clone(), result.exercise_id))
                .or_default();

            for set in result.sets.iter().filter(|s| s.reps > 0) {
                for (i, kind) in [RecordKind::Weight, RecordKind::Reps].into_iter().enumerate() {
                    if kind == RecordKind::Weight && set.weight <= 0.0 {
                        continue;
                    }
                    let candidate = PersonalRecord {
                        exercise_id: result.exercise_id,
                        exercise_name: result.exercise_name.clone(),
                        kind,
                        weight: set.weight,
                        reps: set.reps,
                        achieved_on: entry.date,
                    };
                    let replace = match &slots[i] {
                        Some(current) => better(kind, &candidate, current),
                        None => true,
                    };
                    if replace {
                        slots[i] = Some(candidate);
                    }
                }
            }
        }
    }

    best.into_values().flatten().flatten().collect()
}
