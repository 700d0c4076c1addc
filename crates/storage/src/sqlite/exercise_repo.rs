use fit_core::model::{Exercise, ExerciseId, ValidatedExercise};

use super::SqliteRepository;
use super::mapping::{db_err, exercise_id_from_i64, id_to_i64, map_exercise_row, to_json};
use crate::repository::{ExerciseRepository, StorageError};

const SELECT_EXERCISE: &str = r"
    SELECT id, name, category, muscle_groups, equipment_needed, instructions, is_custom,
           default_sets, default_reps, default_duration,
           default_rest_between_sets, default_rest_after, created_at, updated_at
    FROM exercises
";

#[async_trait::async_trait]
impl ExerciseRepository for SqliteRepository {
    async fn insert_exercise(
        &self,
        exercise: &ValidatedExercise,
    ) -> Result<ExerciseId, StorageError> {
        let defaults = exercise.defaults;
        let res = sqlx::query(
            r"
            INSERT INTO exercises (
                name, category, muscle_groups, equipment_needed, instructions, is_custom,
                default_sets, default_reps, default_duration,
                default_rest_between_sets, default_rest_after, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            ",
        )
        .bind(&exercise.name)
        .bind(exercise.category.as_str())
        .bind(to_json(&exercise.muscle_groups)?)
        .bind(&exercise.equipment_needed)
        .bind(&exercise.instructions)
        .bind(i64::from(exercise.is_custom))
        .bind(i64::from(defaults.sets))
        .bind(defaults.target.reps().map(i64::from))
        .bind(defaults.target.duration_seconds().map(i64::from))
        .bind(i64::from(defaults.rest_between_sets))
        .bind(i64::from(defaults.rest_after))
        .bind(exercise.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        exercise_id_from_i64(res.last_insert_rowid())
    }

    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        let defaults = exercise.defaults;
        let res = sqlx::query(
            r"
            UPDATE exercises SET
                name = ?2,
                category = ?3,
                muscle_groups = ?4,
                equipment_needed = ?5,
                instructions = ?6,
                is_custom = ?7,
                default_sets = ?8,
                default_reps = ?9,
                default_duration = ?10,
                default_rest_between_sets = ?11,
                default_rest_after = ?12,
                updated_at = ?13
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("exercise_id", exercise.id.value())?)
        .bind(&exercise.name)
        .bind(exercise.category.as_str())
        .bind(to_json(&exercise.muscle_groups)?)
        .bind(&exercise.equipment_needed)
        .bind(&exercise.instructions)
        .bind(i64::from(exercise.is_custom))
        .bind(i64::from(defaults.sets))
        .bind(defaults.target.reps().map(i64::from))
        .bind(defaults.target.duration_seconds().map(i64::from))
        .bind(i64::from(defaults.rest_between_sets))
        .bind(i64::from(defaults.rest_after))
        .bind(exercise.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError> {
        let sql = format!("{SELECT_EXERCISE} WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("exercise_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_exercise_row).transpose()
    }

    async fn find_exercise_by_name(&self, name: &str) -> Result<Option<Exercise>, StorageError> {
        let sql = format!("{SELECT_EXERCISE} WHERE name = ?1");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_exercise_row).transpose()
    }

    async fn list_exercises(&self) -> Result<Vec<Exercise>, StorageError> {
        let sql = format!("{SELECT_EXERCISE} ORDER BY name ASC, id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut exercises = Vec::with_capacity(rows.len());
        for row in rows {
            exercises.push(map_exercise_row(&row)?);
        }
        Ok(exercises)
    }

    async fn delete_exercise(&self, id: ExerciseId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM exercises WHERE id = ?1")
            .bind(id_to_i64("exercise_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
