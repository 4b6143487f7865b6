//! Serialized form of per-exercise results
//!
//! Results live in the `exercise_details` column as JSON. Stores without
//! that column get the JSON appended to the notes behind
//! [`PAYLOAD_DELIMITER`], human notes first.

use tracing::warn;

use super::ExerciseResult;
use crate::error::Result;

/// JSON never contains a raw newline, so this cannot appear inside the payload
pub const PAYLOAD_DELIMITER: &str = "\n\n---EXERCISE_DATA---\n";

pub fn to_json(payload: &[ExerciseResult]) -> Result<String> {
    Ok(serde_json::to_string(payload)?)
}

pub fn from_json(json: &str) -> Result<Vec<ExerciseResult>> {
    Ok(serde_json::from_str(json)?)
}

/// Notes text carrying the payload after the delimiter.
///
/// An empty payload leaves the notes untouched.
pub fn embed(notes: &str, payload: &[ExerciseResult]) -> Result<String> {
    if payload.is_empty() {
        return Ok(notes.to_string());
    }
    Ok(format!("{}{}{}", notes, PAYLOAD_DELIMITER, to_json(payload)?))
}

/// Split stored notes into human text and an embedded payload.
///
/// Splits on the last delimiter. A trailer that is not a valid payload is
/// treated as part of the human text.
pub fn split_embedded(raw: &str) -> (String, Option<Vec<ExerciseResult>>) {
    let Some((notes, trailer)) = raw.rsplit_once(PAYLOAD_DELIMITER) else {
        return (raw.to_string(), None);
    };
    match from_json(trailer) {
        Ok(payload) => (notes.to_string(), Some(payload)),
        Err(e) => {
            warn!("Ignoring unreadable embedded payload: {}", e);
            (raw.to_string(), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::SetResult;

    fn create_payload() -> Vec<ExerciseResult> {
        vec![
            ExerciseResult {
                exercise_id: 1,
                exercise_name: "Bench Press".to_string(),
                sets: vec![
                    SetResult { set_number: 1, weight: 40.0, reps: 10 },
                    SetResult { set_number: 2, weight: 42.5, reps: 8 },
                ],
                notes: Some("elbows in\nslow negatives".to_string()),
            },
            ExerciseResult {
                exercise_id: 2,
                exercise_name: "Pull-up".to_string(),
                sets: vec![SetResult { set_number: 1, weight: 0.0, reps: 8 }],
                notes: None,
            },
        ]
    }

    #[test]
    fn test_embed_then_split_restores_both_parts() {
        let notes = "Felt strong.\n\nGym was busy";
        let raw = embed(notes, &create_payload()).unwrap();
        let (human, payload) = split_embedded(&raw);

        assert_eq!(human, notes);
        assert_eq!(payload, Some(create_payload()));
    }

    #[test]
    fn test_empty_notes_round_trip() {
        let raw = embed("", &create_payload()).unwrap();
        assert!(raw.starts_with(PAYLOAD_DELIMITER));

        let (human, payload) = split_embedded(&raw);
        assert_eq!(human, "");
        assert_eq!(payload.unwrap().len(), 2);
    }

    #[test]
    fn test_notes_containing_delimiter() {
        let notes = format!("copied text{}not json", PAYLOAD_DELIMITER);
        let raw = embed(&notes, &create_payload()).unwrap();
        let (human, payload) = split_embedded(&raw);

        assert_eq!(human, notes);
        assert_eq!(payload, Some(create_payload()));
    }

    #[test]
    fn test_plain_notes_have_no_payload() {
        let (human, payload) = split_embedded("just notes");
        assert_eq!(human, "just notes");
        assert!(payload.is_none());
    }

    #[test]
    fn test_broken_trailer_kept_as_text() {
        let raw = format!("notes{}{{broken", PAYLOAD_DELIMITER);
        let (human, payload) = split_embedded(&raw);
        assert_eq!(human, raw);
        assert!(payload.is_none());
    }

    #[test]
    fn test_empty_payload_not_embedded() {
        assert_eq!(embed("rest", &[]).unwrap(), "rest");
    }
}
