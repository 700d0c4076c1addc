use std::sync::Arc;

use fit_core::model::{Exercise, ExerciseDraft, ExerciseId};
use storage::repository::{ExerciseRepository, StorageError};

use crate::Clock;
use crate::error::ExerciseServiceError;

/// Maintains the exercise library.
#[derive(Clone)]
pub struct ExerciseService {
    clock: Clock,
    exercises: Arc<dyn ExerciseRepository>,
}

fn map_storage(id: Option<ExerciseId>, err: StorageError) -> ExerciseServiceError {
    match (err, id) {
        (StorageError::Conflict, Some(id)) => ExerciseServiceError::InUse(id),
        (StorageError::Conflict, None) => ExerciseServiceError::DuplicateName,
        (StorageError::NotFound, Some(id)) => ExerciseServiceError::NotFound(id),
        (other, _) => ExerciseServiceError::Storage(other),
    }
}

impl ExerciseService {
    #[must_use]
    pub fn new(clock: Clock, exercises: Arc<dyn ExerciseRepository>) -> Self {
        Self { clock, exercises }
    }

    /// Validate and persist a new exercise.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError::Exercise` for validation failures and
    /// `DuplicateName` if the name is taken.
    pub async fn create_exercise(
        &self,
        draft: ExerciseDraft,
    ) -> Result<Exercise, ExerciseServiceError> {
        let validated = draft.validate(self.clock.now())?;
        let id = self
            .exercises
            .insert_exercise(&validated)
            .await
            .map_err(|e| map_storage(None, e))?;
        tracing::info!(exercise_id = %id, name = %validated.name, "exercise created");
        Ok(validated.assign_id(id))
    }

    /// Replace an exercise's fields, keeping its ID and creation time.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError::NotFound` if missing, `DuplicateName` if
    /// the new name is taken, or a validation error.
    pub async fn update_exercise(
        &self,
        id: ExerciseId,
        draft: ExerciseDraft,
    ) -> Result<Exercise, ExerciseServiceError> {
        let existing = self
            .exercises
            .get_exercise(id)
            .await?
            .ok_or(ExerciseServiceError::NotFound(id))?;

        let now = self.clock.now();
        let mut updated = draft.validate(now)?.assign_id(id);
        updated.created_at = existing.created_at;
        updated.updated_at = now;

        self.exercises
            .update_exercise(&updated)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => ExerciseServiceError::NotFound(id),
                other => map_storage(None, other),
            })?;
        Ok(updated)
    }

    /// Fetch an exercise by ID.
    ///
    /// Returns `Ok(None)` when the exercise does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError::Storage` if repository access fails.
    pub async fn get_exercise(
        &self,
        id: ExerciseId,
    ) -> Result<Option<Exercise>, ExerciseServiceError> {
        Ok(self.exercises.get_exercise(id).await?)
    }

    /// All exercises ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError::Storage` if repository access fails.
    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, ExerciseServiceError> {
        Ok(self.exercises.list_exercises().await?)
    }

    /// # Errors
    ///
    /// Returns `ExerciseServiceError::NotFound` if missing and `InUse` while a
    /// session still plans the exercise.
    pub async fn delete_exercise(&self, id: ExerciseId) -> Result<(), ExerciseServiceError> {
        self.exercises
            .delete_exercise(id)
            .await
            .map_err(|e| map_storage(Some(id), e))?;
        tracing::info!(exercise_id = %id, "exercise deleted");
        Ok(())
    }
}
