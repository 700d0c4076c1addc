mod exercise;
mod ids;
mod photo;
mod session;

pub use ids::{ExerciseId, ParseIdError, PhotoId, SessionId};

pub use exercise::{
    Exercise, ExerciseCategory, ExerciseDefaults, ExerciseDraft, ExerciseError, SetTarget,
    SetTargetError, ValidatedExercise,
};
pub use photo::{
    MAX_PHOTO_BYTES, Photo, PhotoDimensions, PhotoDraft, PhotoError, PhotoFormat, ValidatedPhoto,
};
pub use session::{
    ExerciseResult, PlannedExercise, PlannedExerciseDraft, SessionDraft, SessionDraftError,
    ValidatedSession, WorkoutSession,
};
