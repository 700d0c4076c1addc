use fit_core::model::{
    Exercise, ExerciseCategory, ExerciseDefaults, ExerciseId, ExerciseResult, Photo,
    PhotoDimensions, PhotoFormat, PhotoId, PlannedExercise, SessionId, SetTarget,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps constraint violations to `Conflict`, everything else to `Connection`.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() || db.is_foreign_key_violation() {
            return StorageError::Conflict;
        }
    }
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn exercise_id_from_i64(v: i64) -> Result<ExerciseId, StorageError> {
    Ok(ExerciseId::new(i64_to_u64("exercise_id", v)?))
}

pub(crate) fn session_id_from_i64(v: i64) -> Result<SessionId, StorageError> {
    Ok(SessionId::new(i64_to_u64("session_id", v)?))
}

pub(crate) fn photo_id_from_i64(v: i64) -> Result<PhotoId, StorageError> {
    Ok(PhotoId::new(i64_to_u64("photo_id", v)?))
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn from_json<T: DeserializeOwned>(raw: Option<String>) -> Result<Option<T>, StorageError> {
    raw.map(|s| serde_json::from_str(&s).map_err(ser)).transpose()
}

fn target_from_row(
    row: &SqliteRow,
    reps_col: &'static str,
    duration_col: &'static str,
) -> Result<SetTarget, StorageError> {
    let reps = row
        .try_get::<Option<i64>, _>(reps_col)
        .map_err(ser)?
        .map(|v| u32_from_i64(reps_col, v))
        .transpose()?;
    let duration = row
        .try_get::<Option<i64>, _>(duration_col)
        .map_err(ser)?
        .map(|v| u32_from_i64(duration_col, v))
        .transpose()?;
    SetTarget::from_parts(reps, duration).map_err(ser)
}

pub(crate) fn map_exercise_row(row: &SqliteRow) -> Result<Exercise, StorageError> {
    let category: String = row.try_get("category").map_err(ser)?;
    let muscle_groups: Vec<String> =
        from_json(row.try_get("muscle_groups").map_err(ser)?)?.unwrap_or_default();

    Ok(Exercise {
        id: exercise_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        category: category.parse::<ExerciseCategory>().map_err(ser)?,
        muscle_groups,
        equipment_needed: row.try_get("equipment_needed").map_err(ser)?,
        instructions: row.try_get("instructions").map_err(ser)?,
        is_custom: row.try_get::<i64, _>("is_custom").map_err(ser)? != 0,
        defaults: ExerciseDefaults {
            sets: u32_from_i64("default_sets", row.try_get("default_sets").map_err(ser)?)?,
            target: target_from_row(row, "default_reps", "default_duration")?,
            rest_between_sets: u32_from_i64(
                "default_rest_between_sets",
                row.try_get("default_rest_between_sets").map_err(ser)?,
            )?,
            rest_after: u32_from_i64(
                "default_rest_after",
                row.try_get("default_rest_after").map_err(ser)?,
            )?,
        },
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

/// Maps a `session_exercises` row joined with `exercises.name AS exercise_name`.
pub(crate) fn map_planned_row(row: &SqliteRow) -> Result<PlannedExercise, StorageError> {
    let result = match row.try_get::<Option<i64>, _>("actual_sets").map_err(ser)? {
        Some(actual_sets) => Some(ExerciseResult {
            actual_sets: u32_from_i64("actual_sets", actual_sets)?,
            actual_values: from_json(row.try_get("actual_values").map_err(ser)?)?
                .unwrap_or_default(),
            weights: from_json(row.try_get("weights").map_err(ser)?)?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(PlannedExercise {
        exercise_id: exercise_id_from_i64(row.try_get::<i64, _>("exercise_id").map_err(ser)?)?,
        exercise_name: row.try_get("exercise_name").map_err(ser)?,
        order: u32_from_i64("position", row.try_get("position").map_err(ser)?)?,
        sets: u32_from_i64("sets", row.try_get("sets").map_err(ser)?)?,
        target: target_from_row(row, "reps", "duration_seconds")?,
        rest_between_sets: u32_from_i64(
            "rest_between_sets",
            row.try_get("rest_between_sets").map_err(ser)?,
        )?,
        rest_after: u32_from_i64("rest_after", row.try_get("rest_after").map_err(ser)?)?,
        result,
    })
}

pub(crate) fn map_photo_row(row: &SqliteRow) -> Result<Photo, StorageError> {
    let mime_type: String = row.try_get("mime_type").map_err(ser)?;
    let format = PhotoFormat::from_mime_type(&mime_type)
        .ok_or_else(|| StorageError::Serialization(format!("invalid mime_type: {mime_type}")))?;
    let width = row.try_get::<Option<i64>, _>("width").map_err(ser)?;
    let height = row.try_get::<Option<i64>, _>("height").map_err(ser)?;
    let dimensions = match (width, height) {
        (Some(w), Some(h)) => Some(PhotoDimensions {
            width: u32_from_i64("width", w)?,
            height: u32_from_i64("height", h)?,
        }),
        _ => None,
    };

    Ok(Photo {
        id: photo_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        filename: row.try_get("filename").map_err(ser)?,
        original_name: row.try_get("original_name").map_err(ser)?,
        capture_date: row.try_get("capture_date").map_err(ser)?,
        notes: row.try_get("notes").map_err(ser)?,
        file_size: i64_to_u64("file_size", row.try_get("file_size").map_err(ser)?)?,
        format,
        dimensions,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(matches!(
            exercise_id_from_i64(-1),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(session_id_from_i64(7).unwrap(), SessionId::new(7));
    }

    #[test]
    fn json_columns_tolerate_null() {
        let none: Option<Vec<u32>> = from_json(None).unwrap();
        assert!(none.is_none());
        let some: Option<Vec<f64>> = from_json(Some("[2.5,0.0]".into())).unwrap();
        assert_eq!(some, Some(vec![2.5, 0.0]));
        assert!(from_json::<Vec<u32>>(Some("not json".into())).is_err());
    }
}
