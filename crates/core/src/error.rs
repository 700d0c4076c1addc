use thiserror::Error;

use crate::model::{ExerciseError, PhotoError, SessionDraftError};
use crate::workout::ExecutionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    SessionDraft(#[from] SessionDraftError),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}
