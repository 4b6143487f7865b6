//! Exercise catalogue - records, tag standardization, starting weights

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_SETS: u32 = 3;
pub const DEFAULT_REPS: u32 = 10;

/// Stored exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub default_sets: u32,
    pub default_reps: u32,
    pub image_url: Option<String>,
}

/// Exercise form input, before it gets an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub description: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub default_sets: u32,
    pub default_reps: u32,
    pub image_url: Option<String>,
}

impl NewExercise {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            muscle_group: None,
            equipment: None,
            default_sets: DEFAULT_SETS,
            default_reps: DEFAULT_REPS,
            image_url: None,
        }
    }

    /// Trim the name, standardize tags and check the defaults
    pub fn normalized(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(Error::validation("exercise name must not be empty"));
        }
        if self.default_sets == 0 || self.default_reps == 0 {
            return Err(Error::validation("default sets and reps must be at least 1"));
        }
        self.muscle_group = self.muscle_group.as_deref().and_then(standard_muscle_group);
        self.equipment = self.equipment.as_deref().and_then(standard_equipment);
        self.description = self.description.filter(|d| !d.trim().is_empty());
        Ok(self)
    }
}

/// Muscle groups offered by the exercise form
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Abs,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    FullBody,
    Core,
    LowerBody,
    UpperBody,
}

impl MuscleGroup {
    pub fn label(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Forearms => "Forearms",
            MuscleGroup::Abs => "Abs",
            MuscleGroup::Quads => "Quads",
            MuscleGroup::Hamstrings => "Hamstrings",
            MuscleGroup::Glutes => "Glutes",
            MuscleGroup::Calves => "Calves",
            MuscleGroup::FullBody => "Full Body",
            MuscleGroup::Core => "Core",
            MuscleGroup::LowerBody => "Lower Body",
            MuscleGroup::UpperBody => "Upper Body",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Pectoralis major and minor",
            MuscleGroup::Back => "Latissimus dorsi, rhomboids and trapezius",
            MuscleGroup::Shoulders => "Anterior, lateral and posterior deltoids",
            MuscleGroup::Biceps => "Biceps brachii",
            MuscleGroup::Triceps => "Triceps brachii",
            MuscleGroup::Forearms => "Brachioradialis and wrist flexors",
            MuscleGroup::Abs => "Rectus abdominis and obliques",
            MuscleGroup::Quads => "Front of the thighs",
            MuscleGroup::Hamstrings => "Back of the thighs",
            MuscleGroup::Glutes => "Gluteus maximus, medius and minimus",
            MuscleGroup::Calves => "Gastrocnemius and soleus",
            MuscleGroup::FullBody => "Several major groups at once",
            MuscleGroup::Core => "Abdominals, obliques and lower back",
            MuscleGroup::LowerBody => "Legs and glutes",
            MuscleGroup::UpperBody => "Chest, back, shoulders and arms",
        }
    }

    pub fn from_label(label: &str) -> Option<MuscleGroup> {
        let label = label.trim();
        MuscleGroup::all().iter().copied().find(|g| g.label().eq_ignore_ascii_case(label))
    }

    /// All muscle groups, in form order
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Shoulders,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
            MuscleGroup::Forearms,
            MuscleGroup::Abs,
            MuscleGroup::Quads,
            MuscleGroup::Hamstrings,
            MuscleGroup::Glutes,
            MuscleGroup::Calves,
            MuscleGroup::FullBody,
            MuscleGroup::Core,
            MuscleGroup::LowerBody,
            MuscleGroup::UpperBody,
        ]
    }
}

pub const EQUIPMENT: &[&str] = &[
    "Barbell",
    "Dumbbell",
    "Kettlebell",
    "Machine",
    "Cable",
    "Bodyweight",
    "Resistance Band",
    "Smith Machine",
    "TRX/Suspension",
    "Medicine Ball",
    "Bench",
    "Pull-up Bar",
    "Foam Roller",
    "Stability Ball",
    "BOSU Ball",
    "Battle Ropes",
    "Sled",
    "None",
];

/// Shortest input matched as a fragment of a label; shorter tags are
/// abbreviations ("bb", "db") handled by the alias tables
const MIN_FRAGMENT_LEN: usize = 3;

/// Exact label, then substring either way, in list order
fn match_label<'a>(input: &str, labels: impl Iterator<Item = &'a str> + Clone) -> Option<&'a str> {
    let lower = input.to_lowercase();
    labels
        .clone()
        .find(|label| label.to_lowercase() == lower)
        .or_else(|| {
            labels.into_iter().find(|label| {
                let key = label.to_lowercase();
                lower.contains(&key) || (lower.chars().count() >= MIN_FRAGMENT_LEN && key.contains(&lower))
            })
        })
}

/// Map a free-text muscle tag onto a known group.
///
/// Unknown tags are kept as typed (trimmed); blank input yields `None`.
pub fn standard_muscle_group(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(label) = match_label(trimmed, MuscleGroup::all().iter().map(|g| g.label())) {
        return Some(label.to_string());
    }

    let lower = trimmed.to_lowercase();
    let group = if lower.contains("pec") {
        Some(MuscleGroup::Chest)
    } else if lower.contains("lat") || lower.contains("trap") {
        Some(MuscleGroup::Back)
    } else if lower.contains("delt") {
        Some(MuscleGroup::Shoulders)
    } else if lower.contains("quad") {
        Some(MuscleGroup::Quads)
    } else if lower.contains("ham") {
        Some(MuscleGroup::Hamstrings)
    } else if lower.contains("glut") {
        Some(MuscleGroup::Glutes)
    } else if lower.contains("calf") || lower.contains("calv") {
        Some(MuscleGroup::Calves)
    } else if lower.contains("ab") {
        Some(MuscleGroup::Abs)
    } else if lower.contains("leg") {
        Some(MuscleGroup::LowerBody)
    } else if lower.contains("arm") && !lower.contains("fore") {
        Some(MuscleGroup::UpperBody)
    } else {
        None
    };

    Some(group.map_or_else(|| trimmed.to_string(), |g| g.label().to_string()))
}

/// Map a free-text equipment tag onto a known type (unknown kept as typed)
pub fn standard_equipment(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(label) = match_label(trimmed, EQUIPMENT.iter().copied()) {
        return Some(label.to_string());
    }

    let lower = trimmed.to_lowercase();
    let label = if lower.contains("body weight") {
        Some("Bodyweight")
    } else if lower.contains("db") {
        Some("Dumbbell")
    } else if lower.contains("bb") {
        Some("Barbell")
    } else if lower.contains("kb") {
        Some("Kettlebell")
    } else if lower.contains("band") {
        Some("Resistance Band")
    } else if lower.contains("suspension") {
        Some("TRX/Suspension")
    } else if lower.contains("n/a") {
        Some("None")
    } else {
        None
    };

    Some(label.map_or_else(|| trimmed.to_string(), str::to_string))
}

/// Known starting weights for a lift
#[derive(Debug, Clone, Copy)]
pub struct StartingWeights {
    pub name: &'static str,
    /// (weight kg, reps) per set
    pub sets: &'static [(f64, u32)],
    pub notes: Option<&'static str>,
}

pub const STARTING_WEIGHTS: &[StartingWeights] = &[
    StartingWeights {
        name: "Bench Press",
        sets: &[(40.0, 10), (50.0, 8), (60.0, 6)],
        notes: Some("PR: 65kg"),
    },
    StartingWeights {
        name: "Incline Bench Press",
        sets: &[(30.0, 10), (40.0, 8), (40.0, 8)],
        notes: None,
    },
    StartingWeights {
        name: "Dumbbell Fly",
        sets: &[(12.0, 12), (14.0, 10), (16.0, 8)],
        notes: None,
    },
    StartingWeights {
        name: "Deadlift",
        sets: &[(60.0, 8), (80.0, 6), (100.0, 4)],
        notes: Some("Focus on form"),
    },
    StartingWeights {
        name: "Barbell Row",
        sets: &[(40.0, 10), (50.0, 8), (60.0, 6)],
        notes: None,
    },
    StartingWeights {
        name: "Lat Pulldown",
        sets: &[(45.0, 12), (55.0, 10), (65.0, 8)],
        notes: None,
    },
    StartingWeights {
        name: "Pull-up",
        sets: &[(0.0, 8), (0.0, 8), (0.0, 6)],
        notes: Some("Bodyweight"),
    },
    StartingWeights {
        name: "Squat",
        sets: &[(60.0, 10), (70.0, 8), (80.0, 6)],
        notes: None,
    },
    StartingWeights {
        name: "Leg Press",
        sets: &[(100.0, 12), (120.0, 10), (140.0, 8)],
        notes: None,
    },
    StartingWeights {
        name: "Overhead Press",
        sets: &[(30.0, 10), (35.0, 8), (40.0, 6)],
        notes: None,
    },
    StartingWeights {
        name: "Bicep Curl",
        sets: &[(10.0, 12), (12.0, 10), (14.0, 8)],
        notes: None,
    },
    StartingWeights {
        name: "Tricep Pushdown",
        sets: &[(20.0, 12), (25.0, 10), (30.0, 8)],
        notes: None,
    },
];

/// Starting weights by name: exact, then case-insensitive, then substring
pub fn starting_weights(name: &str) -> Option<&'static StartingWeights> {
    let lower = name.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    STARTING_WEIGHTS
        .iter()
        .find(|w| w.name == name)
        .or_else(|| STARTING_WEIGHTS.iter().find(|w| w.name.to_lowercase() == lower))
        .or_else(|| {
            STARTING_WEIGHTS.iter().find(|w| {
                let key = w.name.to_lowercase();
                key.contains(&lower) || lower.contains(&key)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muscle_group_exact_and_case() {
        assert_eq!(standard_muscle_group("chest").as_deref(), Some("Chest"));
        assert_eq!(standard_muscle_group("  FULL BODY ").as_deref(), Some("Full Body"));
    }

    #[test]
    fn test_muscle_group_aliases() {
        assert_eq!(standard_muscle_group("pecs").as_deref(), Some("Chest"));
        assert_eq!(standard_muscle_group("lats").as_deref(), Some("Back"));
        assert_eq!(standard_muscle_group("front delts").as_deref(), Some("Shoulders"));
        assert_eq!(standard_muscle_group("legs").as_deref(), Some("Lower Body"));
    }

    #[test]
    fn test_muscle_group_unknown_kept() {
        assert_eq!(standard_muscle_group("neck").as_deref(), Some("neck"));
        assert_eq!(standard_muscle_group("   "), None);
    }

    #[test]
    fn test_equipment_aliases() {
        assert_eq!(standard_equipment("DB").as_deref(), Some("Dumbbell"));
        assert_eq!(standard_equipment("kb swing").as_deref(), Some("Kettlebell"));
        assert_eq!(standard_equipment("mini band").as_deref(), Some("Resistance Band"));
        assert_eq!(standard_equipment("cable").as_deref(), Some("Cable"));
    }

    #[test]
    fn test_equipment_abbreviations_not_read_as_fragments() {
        assert_eq!(standard_equipment("bb").as_deref(), Some("Barbell"));
        assert_eq!(standard_equipment("BB").as_deref(), Some("Barbell"));
        assert_eq!(standard_equipment("db").as_deref(), Some("Dumbbell"));
        assert_eq!(standard_equipment("kb").as_deref(), Some("Kettlebell"));
        assert_eq!(standard_equipment("dumb").as_deref(), Some("Dumbbell"));
    }

    #[test]
    fn test_muscle_group_short_tags() {
        assert_eq!(standard_muscle_group("ab").as_deref(), Some("Abs"));
        assert_eq!(standard_muscle_group("tri").as_deref(), Some("Triceps"));
    }

    #[test]
    fn test_muscle_group_lookup_by_label() {
        assert_eq!(MuscleGroup::from_label("full body"), Some(MuscleGroup::FullBody));
        assert_eq!(MuscleGroup::from_label("neck"), None);
        assert!(MuscleGroup::Chest.description().contains("Pectoralis"));
    }

    #[test]
    fn test_new_exercise_normalized() {
        let mut ex = NewExercise::new("  Bench Press ");
        ex.muscle_group = Some("pecs".to_string());
        ex.description = Some("   ".to_string());
        let ex = ex.normalized().unwrap();

        assert_eq!(ex.name, "Bench Press");
        assert_eq!(ex.muscle_group.as_deref(), Some("Chest"));
        assert!(ex.description.is_none());
    }

    #[test]
    fn test_new_exercise_rejects_blank_name() {
        let err = NewExercise::new("  ").normalized().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_new_exercise_rejects_zero_sets() {
        let mut ex = NewExercise::new("Squat");
        ex.default_sets = 0;
        assert!(ex.normalized().is_err());
    }

    #[test]
    fn test_starting_weights_lookup() {
        assert_eq!(starting_weights("Bench Press").unwrap().sets.len(), 3);
        assert_eq!(starting_weights("deadlift").unwrap().name, "Deadlift");
        assert_eq!(starting_weights("Wide Grip Lat Pulldown").unwrap().name, "Lat Pulldown");
        assert!(starting_weights("Nordic Curl").is_none());
    }
}
