use std::sync::Arc;

use chrono::{DateTime, Utc};
use fit_core::model::{
    Exercise, PlannedExerciseDraft, SessionDraft, SessionId, ValidatedSession, WorkoutSession,
};
use storage::repository::{ExerciseRepository, SessionRepository, StorageError};

use crate::Clock;
use crate::error::PlanServiceError;

/// A planned exercise pre-filled from the exercise's library defaults.
#[must_use]
pub fn planned_from_defaults(exercise: &Exercise, order: u32) -> PlannedExerciseDraft {
    let defaults = exercise.defaults;
    PlannedExerciseDraft {
        exercise_id: exercise.id,
        order,
        sets: defaults.sets,
        reps: defaults.target.reps(),
        duration_seconds: defaults.target.duration_seconds(),
        rest_between_sets: defaults.rest_between_sets,
        rest_after: defaults.rest_after,
    }
}

/// Creates, lists and maintains session plans and templates.
#[derive(Clone)]
pub struct SessionPlanService {
    clock: Clock,
    exercises: Arc<dyn ExerciseRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl SessionPlanService {
    #[must_use]
    pub fn new(
        clock: Clock,
        exercises: Arc<dyn ExerciseRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            clock,
            exercises,
            sessions,
        }
    }

    /// Validate and store a session plan.
    ///
    /// # Errors
    ///
    /// Returns `PlanServiceError::Draft` for invalid drafts and
    /// `UnknownExercise` when a planned exercise is not in the library.
    pub async fn create_session(
        &self,
        draft: SessionDraft,
    ) -> Result<WorkoutSession, PlanServiceError> {
        let validated = draft.validate()?;
        self.store(validated).await
    }

    /// Same as [`Self::create_session`] with the template flag forced on.
    ///
    /// # Errors
    ///
    /// See [`Self::create_session`].
    pub async fn create_template(
        &self,
        mut draft: SessionDraft,
    ) -> Result<WorkoutSession, PlanServiceError> {
        draft.is_template = true;
        self.create_session(draft).await
    }

    /// Copy a template into a new session dated `date` (or now).
    ///
    /// # Errors
    ///
    /// Returns `PlanServiceError::NotFound` if missing and `NotATemplate` for
    /// regular sessions.
    pub async fn instantiate_template(
        &self,
        template_id: SessionId,
        date: Option<DateTime<Utc>>,
    ) -> Result<WorkoutSession, PlanServiceError> {
        let template = self.require(template_id).await?;
        if !template.is_template {
            return Err(PlanServiceError::NotATemplate(template_id));
        }
        let date = date.unwrap_or_else(|| self.clock.now());
        let session = self.store(template.instantiate(date)).await?;
        tracing::info!(
            template_id = %template_id,
            session_id = %session.id,
            "session created from template"
        );
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `PlanServiceError::EmptyTitle` for a blank title and `NotFound`
    /// if the session does not exist.
    pub async fn rename_session(
        &self,
        id: SessionId,
        title: &str,
    ) -> Result<(), PlanServiceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(PlanServiceError::EmptyTitle);
        }
        self.sessions
            .rename_session(id, title)
            .await
            .map_err(|e| not_found_as(id, e))
    }

    /// Fetch a session by ID.
    ///
    /// Returns `Ok(None)` when the session does not exist.
    ///
    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` if repository access fails.
    pub async fn get_session(
        &self,
        id: SessionId,
    ) -> Result<Option<WorkoutSession>, PlanServiceError> {
        Ok(self.sessions.get_session(id).await?)
    }

    /// Non-template sessions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` if repository access fails.
    pub async fn list_sessions(&self) -> Result<Vec<WorkoutSession>, PlanServiceError> {
        Ok(self.sessions.list_sessions().await?)
    }

    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` if repository access fails.
    pub async fn list_templates(&self) -> Result<Vec<WorkoutSession>, PlanServiceError> {
        Ok(self.sessions.list_templates().await?)
    }

    /// # Errors
    ///
    /// Returns `PlanServiceError::NotFound` if the session does not exist.
    pub async fn delete_session(&self, id: SessionId) -> Result<(), PlanServiceError> {
        self.sessions
            .delete_session(id)
            .await
            .map_err(|e| not_found_as(id, e))?;
        tracing::info!(session_id = %id, "session deleted");
        Ok(())
    }

    async fn require(&self, id: SessionId) -> Result<WorkoutSession, PlanServiceError> {
        self.sessions
            .get_session(id)
            .await?
            .ok_or(PlanServiceError::NotFound(id))
    }

    async fn store(&self, validated: ValidatedSession) -> Result<WorkoutSession, PlanServiceError> {
        for planned in &validated.exercises {
            if self
                .exercises
                .get_exercise(planned.exercise_id)
                .await?
                .is_none()
            {
                return Err(PlanServiceError::UnknownExercise(planned.exercise_id));
            }
        }

        let id = self.sessions.insert_session(&validated).await?;
        tracing::info!(
            session_id = %id,
            template = validated.is_template,
            exercises = validated.exercises.len(),
            "session stored"
        );
        // reload so planned exercises carry their library names
        self.require(id).await
    }
}

fn not_found_as(id: SessionId, err: StorageError) -> PlanServiceError {
    match err {
        StorageError::NotFound => PlanServiceError::NotFound(id),
        other => PlanServiceError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fit_core::model::{ExerciseCategory, ExerciseDefaults, ExerciseDraft, ExerciseId, SetTarget};
    use fit_core::time::fixed_now;
    use storage::repository::{ExerciseRepository, InMemoryRepository};

    async fn setup() -> (SessionPlanService, Exercise) {
        let repo = InMemoryRepository::new();
        let validated = ExerciseDraft {
            name: "Plank".into(),
            category: ExerciseCategory::Force,
            muscle_groups: vec!["abs".into()],
            equipment_needed: None,
            instructions: None,
            is_custom: false,
            defaults: ExerciseDefaults {
                sets: 3,
                target: SetTarget::Duration(30),
                rest_between_sets: 60,
                rest_after: 120,
            },
        }
        .validate(fixed_now())
        .unwrap();
        let id = repo.insert_exercise(&validated).await.unwrap();
        let service = SessionPlanService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo),
        );
        (service, validated.assign_id(id))
    }

    fn draft(exercises: Vec<PlannedExerciseDraft>) -> SessionDraft {
        SessionDraft {
            title: "Core".into(),
            date: fixed_now(),
            warmup_seconds: 180,
            is_template: false,
            exercises,
        }
    }

    #[tokio::test]
    async fn planned_defaults_follow_the_library() {
        let (service, plank) = setup().await;
        let session = service
            .create_session(draft(vec![planned_from_defaults(&plank, 1)]))
            .await
            .unwrap();

        assert_eq!(session.exercises[0].target, SetTarget::Duration(30));
        assert_eq!(session.exercises[0].exercise_name.as_deref(), Some("Plank"));
        assert!(!session.is_template);
    }

    #[tokio::test]
    async fn unknown_exercises_are_rejected() {
        let (service, plank) = setup().await;
        let mut planned = planned_from_defaults(&plank, 1);
        planned.exercise_id = ExerciseId::new(77);
        let err = service.create_session(draft(vec![planned])).await.unwrap_err();
        assert!(matches!(err, PlanServiceError::UnknownExercise(id) if id == ExerciseId::new(77)));
    }

    #[tokio::test]
    async fn templates_instantiate_into_fresh_sessions() {
        let (service, plank) = setup().await;
        let template = service
            .create_template(draft(vec![planned_from_defaults(&plank, 1)]))
            .await
            .unwrap();
        assert!(template.is_template);

        let session = service
            .instantiate_template(template.id, None)
            .await
            .unwrap();
        assert_ne!(session.id, template.id);
        assert!(!session.is_template);
        assert_eq!(session.warmup_seconds, 180);
        assert_eq!(session.exercises.len(), 1);

        let err = service
            .instantiate_template(session.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanServiceError::NotATemplate(_)));

        assert_eq!(service.list_templates().await.unwrap().len(), 1);
        assert_eq!(service.list_sessions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rename_trims_and_rejects_blank_titles() {
        let (service, plank) = setup().await;
        let session = service
            .create_session(draft(vec![planned_from_defaults(&plank, 1)]))
            .await
            .unwrap();

        service.rename_session(session.id, "  Evening core ").await.unwrap();
        let renamed = service.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(renamed.title, "Evening core");

        assert!(matches!(
            service.rename_session(session.id, "   ").await.unwrap_err(),
            PlanServiceError::EmptyTitle
        ));
        assert!(matches!(
            service.rename_session(SessionId::new(404), "x").await.unwrap_err(),
            PlanServiceError::NotFound(_)
        ));
    }
}
