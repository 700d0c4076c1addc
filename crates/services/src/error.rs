//! Shared error types for the services crate.

use thiserror::Error;

use fit_core::model::{
    ExerciseError, ExerciseId, PhotoError, PhotoId, SessionDraftError, SessionId,
};
use fit_core::workout::ExecutionError;
use storage::repository::StorageError;
use storage::seed::SeedError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ExerciseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExerciseServiceError {
    #[error("exercise {0} not found")]
    NotFound(ExerciseId),
    #[error("an exercise with this name already exists")]
    DuplicateName,
    #[error("exercise {0} is still used by a session")]
    InUse(ExerciseId),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionPlanService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanServiceError {
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("session {0} is not a template")]
    NotATemplate(SessionId),
    #[error("planned exercise {0} does not exist")]
    UnknownExercise(ExerciseId),
    #[error("session title cannot be empty")]
    EmptyTitle,
    #[error(transparent)]
    Draft(#[from] SessionDraftError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `WorkoutLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorkoutError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("session {0} is a template; instantiate it before running")]
    Template(SessionId),
    #[error("session {0} has already been completed")]
    AlreadyCompleted(SessionId),
    #[error("workout is not finished")]
    NotFinished,
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PhotoService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PhotoServiceError {
    #[error("photo {0} not found")]
    NotFound(PhotoId),
    #[error("a photo is already stored under this filename; retry the upload")]
    DuplicateFilename,
    #[error("invalid timeline grouping {0:?}; valid options: day, month")]
    InvalidGrouping(String),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AnalyticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error("invalid date range {0:?}; valid options: 30d, 3m, 6m, 1y")]
    InvalidRange(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Seed(#[from] SeedError),
}
