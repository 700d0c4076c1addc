use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fit_core::model::{
    ExerciseCategory, ExerciseDefaults, ExerciseDraft, ExerciseId, PlannedExerciseDraft,
    SessionDraft, SessionId, SetTarget, ValidatedSession, WorkoutSession,
};
use fit_core::time::fixed_now;
use fit_core::workout::{ExecutionError, ExercisePayload, RestKind, Transition, WorkoutPhase};
use services::{Clock, WorkoutError, WorkoutLoopService};
use storage::repository::{
    ExerciseRepository, InMemoryRepository, SessionRepository, StorageError,
};

async fn exercise(repo: &InMemoryRepository, name: &str, target: SetTarget) -> ExerciseId {
    let validated = ExerciseDraft {
        name: name.into(),
        category: ExerciseCategory::Force,
        muscle_groups: vec!["chest".into()],
        equipment_needed: None,
        instructions: None,
        is_custom: false,
        defaults: ExerciseDefaults {
            sets: 2,
            target,
            rest_between_sets: 45,
            rest_after: 90,
        },
    }
    .validate(fixed_now())
    .unwrap();
    repo.insert_exercise(&validated).await.unwrap()
}

fn planned(exercise_id: ExerciseId, order: u32, sets: u32) -> PlannedExerciseDraft {
    PlannedExerciseDraft {
        exercise_id,
        order,
        sets,
        reps: Some(10),
        duration_seconds: None,
        rest_between_sets: 45,
        rest_after: 90,
    }
}

async fn session(
    repo: &InMemoryRepository,
    warmup_seconds: u32,
    exercises: Vec<PlannedExerciseDraft>,
) -> SessionId {
    let validated = SessionDraft {
        title: "Push day".into(),
        date: fixed_now(),
        warmup_seconds,
        is_template: false,
        exercises,
    }
    .validate()
    .unwrap();
    repo.insert_session(&validated).await.unwrap()
}

fn service(repo: &InMemoryRepository, at: DateTime<Utc>) -> WorkoutLoopService {
    WorkoutLoopService::new(Clock::fixed(at), Arc::new(repo.clone()))
}

#[tokio::test]
async fn completed_workout_is_persisted_once() {
    let repo = InMemoryRepository::new();
    let push = exercise(&repo, "Push-ups", SetTarget::Reps(10)).await;
    let squat = exercise(&repo, "Squats", SetTarget::Reps(15)).await;
    let id = session(&repo, 3, vec![planned(push, 1, 2), planned(squat, 2, 1)]).await;

    let svc = service(&repo, fixed_now());
    let mut run = svc.start(id).await.unwrap();
    assert_eq!(run.phase(), WorkoutPhase::WarmingUp);
    assert_eq!(run.title(), "Push day");

    // armed warm-up does not move until started
    assert!(svc.tick(&mut run).transition.is_none());
    svc.begin_warmup(&mut run).unwrap();
    assert!(svc.tick(&mut run).transition.is_none());
    assert!(svc.tick(&mut run).transition.is_none());
    let step = svc.tick(&mut run);
    assert_eq!(step.transition, Some(Transition::ExercisesStarted));
    assert_eq!(step.phase, WorkoutPhase::PerformingSet);

    let step = svc.record_set(&mut run, 10, 0.0).await.unwrap();
    assert!(matches!(step.transition, Some(Transition::RestStarted { seconds: 45, .. })));
    svc.skip_rest(&mut run).unwrap();
    svc.record_set(&mut run, 8, 0.0).await.unwrap();
    svc.skip_rest(&mut run).unwrap();

    let later = svc.clone().with_clock(Clock::fixed(fixed_now() + Duration::seconds(754)));
    let step = later.record_set(&mut run, 15, 20.0).await.unwrap();
    assert!(step.persisted);
    assert_eq!(step.phase, WorkoutPhase::Completed);
    let Some(Transition::Completed(report)) = step.transition else {
        panic!("expected completion");
    };
    assert_eq!(report.duration_seconds, 754);
    assert!(!run.needs_finalize());

    let stored = repo.get_session(id).await.unwrap().unwrap();
    assert!(stored.completed);
    assert!(!stored.terminated_early);
    assert_eq!(stored.duration_seconds, Some(754));
    let push_result = stored.exercises[0].result.as_ref().unwrap();
    assert_eq!(push_result.actual_values, vec![10, 8]);
    let squat_result = stored.exercises[1].result.as_ref().unwrap();
    assert_eq!(squat_result.weights, vec![20.0]);

    assert!(later.finalize(&mut run).await.unwrap());
    assert!(matches!(
        later.record_set(&mut run, 1, 0.0).await.unwrap_err(),
        WorkoutError::Execution(ExecutionError::InvalidTransition { .. })
    ));
    assert!(matches!(
        svc.start(id).await.unwrap_err(),
        WorkoutError::AlreadyCompleted(_)
    ));
}

#[tokio::test]
async fn early_termination_stores_attempted_exercises_only() {
    let repo = InMemoryRepository::new();
    let push = exercise(&repo, "Push-ups", SetTarget::Reps(10)).await;
    let squat = exercise(&repo, "Squats", SetTarget::Reps(15)).await;
    let id = session(&repo, 0, vec![planned(push, 1, 3), planned(squat, 2, 2)]).await;

    let svc = service(&repo, fixed_now());
    let mut run = svc.start(id).await.unwrap();
    assert_eq!(run.phase(), WorkoutPhase::PerformingSet);
    svc.record_set(&mut run, 10, 5.0).await.unwrap();

    let step = svc.terminate(&mut run).await.unwrap();
    assert!(step.persisted);
    let Some(Transition::Terminated(report)) = step.transition else {
        panic!("expected termination");
    };
    assert_eq!(report.stats.sets_completed, 1);
    assert_eq!(report.payload.as_ref().map(Vec::len), Some(1));

    let stored = repo.get_session(id).await.unwrap().unwrap();
    assert!(stored.completed);
    assert!(stored.terminated_early);
    assert_eq!(stored.exercises[0].result.as_ref().unwrap().actual_values, vec![10]);
    assert!(stored.exercises[1].result.is_none());
}

#[tokio::test]
async fn termination_after_a_finished_exercise_stores_only_that_exercise() {
    let repo = InMemoryRepository::new();
    let push = exercise(&repo, "Push-ups", SetTarget::Reps(10)).await;
    let squat = exercise(&repo, "Squats", SetTarget::Reps(15)).await;
    let id = session(&repo, 0, vec![planned(push, 1, 2), planned(squat, 2, 2)]).await;

    let svc = service(&repo, fixed_now());
    let mut run = svc.start(id).await.unwrap();
    svc.record_set(&mut run, 10, 20.0).await.unwrap();
    svc.skip_rest(&mut run).unwrap();
    let step = svc.record_set(&mut run, 8, 20.0).await.unwrap();
    assert_eq!(
        step.transition,
        Some(Transition::RestStarted {
            kind: RestKind::AfterExercise,
            seconds: 90
        })
    );
    svc.skip_rest(&mut run).unwrap();

    let step = svc.terminate(&mut run).await.unwrap();
    assert!(step.persisted);
    let Some(Transition::Terminated(report)) = step.transition else {
        panic!("expected termination");
    };
    assert_eq!(report.progress.completed.len(), 1);
    assert!(report.progress.partial.is_empty());
    assert_eq!(report.progress.untouched.len(), 1);
    assert_eq!(report.stats.completion_percentage, 50);

    let stored = repo.get_session(id).await.unwrap().unwrap();
    assert!(stored.completed);
    assert!(stored.terminated_early);
    let first = stored.exercises[0].result.as_ref().unwrap();
    assert_eq!(first.actual_sets, 2);
    assert_eq!(first.actual_values, vec![10, 8]);
    assert_eq!(first.weights, vec![20.0, 20.0]);
    assert!(stored.exercises[1].result.is_none());
}

#[tokio::test]
async fn terminating_before_any_set_persists_nothing() {
    let repo = InMemoryRepository::new();
    let push = exercise(&repo, "Push-ups", SetTarget::Reps(10)).await;
    let id = session(&repo, 120, vec![planned(push, 1, 2)]).await;

    let svc = service(&repo, fixed_now());
    let mut run = svc.start(id).await.unwrap();
    assert!(matches!(
        svc.terminate(&mut run).await.unwrap_err(),
        WorkoutError::Execution(ExecutionError::InvalidTransition { .. })
    ));

    svc.skip_warmup(&mut run).unwrap();
    let step = svc.terminate(&mut run).await.unwrap();
    assert!(!step.persisted);
    assert_eq!(step.phase, WorkoutPhase::Terminated);
    assert!(!svc.finalize(&mut run).await.unwrap());

    let stored = repo.get_session(id).await.unwrap().unwrap();
    assert!(!stored.completed);
    assert_eq!(stored.duration_seconds, None);
}

#[tokio::test]
async fn templates_and_missing_sessions_cannot_start() {
    let repo = InMemoryRepository::new();
    let push = exercise(&repo, "Push-ups", SetTarget::Reps(10)).await;
    let template = SessionDraft {
        title: "Template".into(),
        date: fixed_now(),
        warmup_seconds: 0,
        is_template: true,
        exercises: vec![planned(push, 1, 1)],
    }
    .validate()
    .unwrap();
    let template_id = repo.insert_session(&template).await.unwrap();
    let empty_id = session(&repo, 0, Vec::new()).await;

    let svc = service(&repo, fixed_now());
    assert!(matches!(
        svc.start(template_id).await.unwrap_err(),
        WorkoutError::Template(_)
    ));
    assert!(matches!(
        svc.start(SessionId::new(999)).await.unwrap_err(),
        WorkoutError::SessionNotFound(_)
    ));
    assert!(matches!(
        svc.start(empty_id).await.unwrap_err(),
        WorkoutError::Execution(ExecutionError::NoExercises)
    ));
}

/// Delegates to an in-memory repository but fails the first outcome writes.
struct FlakySessions {
    inner: InMemoryRepository,
    failures_left: AtomicU32,
    writes: AtomicU32,
}

impl FlakySessions {
    fn fail_next(&self) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StorageError::Connection("database is locked".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for FlakySessions {
    async fn insert_session(&self, session: &ValidatedSession) -> Result<SessionId, StorageError> {
        self.inner.insert_session(session).await
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<WorkoutSession>, StorageError> {
        self.inner.get_session(id).await
    }

    async fn list_sessions(&self) -> Result<Vec<WorkoutSession>, StorageError> {
        self.inner.list_sessions().await
    }

    async fn list_templates(&self) -> Result<Vec<WorkoutSession>, StorageError> {
        self.inner.list_templates().await
    }

    async fn rename_session(&self, id: SessionId, title: &str) -> Result<(), StorageError> {
        self.inner.rename_session(id, title).await
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        self.inner.delete_session(id).await
    }

    async fn record_completion(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
    ) -> Result<(), StorageError> {
        self.fail_next()?;
        self.inner.record_completion(id, duration_seconds, results).await
    }

    async fn record_termination(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
    ) -> Result<(), StorageError> {
        self.fail_next()?;
        self.inner.record_termination(id, duration_seconds, results).await
    }

    async fn list_completed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkoutSession>, StorageError> {
        self.inner.list_completed_since(since).await
    }
}

#[tokio::test]
async fn failed_hand_off_is_retried_by_finalize() {
    let repo = InMemoryRepository::new();
    let push = exercise(&repo, "Push-ups", SetTarget::Reps(10)).await;
    let id = session(&repo, 0, vec![planned(push, 1, 1)]).await;

    let flaky = Arc::new(FlakySessions {
        inner: repo.clone(),
        failures_left: AtomicU32::new(1),
        writes: AtomicU32::new(0),
    });
    let svc = WorkoutLoopService::new(Clock::fixed(fixed_now()), flaky.clone());
    let mut run = svc.start(id).await.unwrap();

    assert!(matches!(
        svc.record_set(&mut run, 12, 0.0).await.unwrap_err(),
        WorkoutError::Storage(StorageError::Connection(_))
    ));
    assert_eq!(run.phase(), WorkoutPhase::Completed);
    assert!(run.needs_finalize());
    assert!(!repo.get_session(id).await.unwrap().unwrap().completed);

    assert!(svc.finalize(&mut run).await.unwrap());
    assert!(run.is_persisted());
    assert!(svc.finalize(&mut run).await.unwrap());
    assert_eq!(flaky.writes.load(Ordering::SeqCst), 2);

    let stored = repo.get_session(id).await.unwrap().unwrap();
    assert!(stored.completed);
    assert_eq!(stored.exercises[0].result.as_ref().unwrap().actual_values, vec![12]);
}

#[tokio::test]
async fn finalize_rejects_running_workouts() {
    let repo = InMemoryRepository::new();
    let push = exercise(&repo, "Push-ups", SetTarget::Reps(10)).await;
    let id = session(&repo, 0, vec![planned(push, 1, 2)]).await;

    let svc = service(&repo, fixed_now());
    let mut run = svc.start(id).await.unwrap();
    assert!(matches!(
        svc.finalize(&mut run).await.unwrap_err(),
        WorkoutError::NotFinished
    ));
}
