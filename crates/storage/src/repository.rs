use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fit_core::model::{
    Exercise, ExerciseId, Photo, PhotoId, SessionId, ValidatedExercise, ValidatedPhoto,
    ValidatedSession, WorkoutSession,
};
use fit_core::workout::ExercisePayload;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the exercise library.
#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// Persist a new exercise and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the name is already taken.
    async fn insert_exercise(&self, exercise: &ValidatedExercise)
    -> Result<ExerciseId, StorageError>;

    /// Overwrite an existing exercise.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, `Conflict` on a duplicate name.
    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StorageError>;

    /// Fetch an exercise by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError>;

    /// Fetch an exercise by its exact name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_exercise_by_name(&self, name: &str) -> Result<Option<Exercise>, StorageError>;

    /// All exercises ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_exercises(&self) -> Result<Vec<Exercise>, StorageError>;

    /// Remove an exercise.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, `Conflict` while a session
    /// still plans it.
    async fn delete_exercise(&self, id: ExerciseId) -> Result<(), StorageError>;
}

/// Repository contract for sessions, templates and their recorded results.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a session plan and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a planned exercise does not exist.
    async fn insert_session(&self, session: &ValidatedSession) -> Result<SessionId, StorageError>;

    /// Fetch a session with its planned exercises, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_session(&self, id: SessionId) -> Result<Option<WorkoutSession>, StorageError>;

    /// Non-template sessions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_sessions(&self) -> Result<Vec<WorkoutSession>, StorageError>;

    /// Templates ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_templates(&self) -> Result<Vec<WorkoutSession>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn rename_session(&self, id: SessionId, title: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError>;

    /// Mark a session completed and store results for every planned exercise.
    ///
    /// Results are matched to planned exercises by `order`. Writing the same
    /// outcome twice leaves the session unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist and
    /// `Conflict` for templates.
    async fn record_completion(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
    ) -> Result<(), StorageError>;

    /// Mark a session completed early, storing results only for the exercises
    /// in `results`. Other planned exercises keep no result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist and
    /// `Conflict` for templates.
    async fn record_termination(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
    ) -> Result<(), StorageError>;

    /// Completed, non-template sessions dated on or after `since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_completed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkoutSession>, StorageError>;
}

/// Repository contract for progress photo metadata.
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Persist photo metadata and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the stored filename is already taken.
    async fn insert_photo(&self, photo: &ValidatedPhoto) -> Result<PhotoId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, StorageError>;

    /// All photos, most recently captured first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_photos(&self) -> Result<Vec<Photo>, StorageError>;

    /// Replace the notes of a photo.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the photo does not exist.
    async fn update_photo_notes(
        &self,
        id: PhotoId,
        notes: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Remove a photo and return the metadata it had.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the photo does not exist.
    async fn delete_photo(&self, id: PhotoId) -> Result<Photo, StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    exercises: Arc<Mutex<HashMap<ExerciseId, Exercise>>>,
    sessions: Arc<Mutex<HashMap<SessionId, WorkoutSession>>>,
    photos: Arc<Mutex<HashMap<PhotoId, Photo>>>,
}

fn lock_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill `exercise_name` from the library, as the SQL join does.
    fn with_names(&self, mut session: WorkoutSession) -> Result<WorkoutSession, StorageError> {
        let exercises = self.exercises.lock().map_err(lock_err)?;
        for planned in &mut session.exercises {
            planned.exercise_name = exercises.get(&planned.exercise_id).map(|e| e.name.clone());
        }
        Ok(session)
    }

    fn collect_sessions(
        &self,
        keep: impl Fn(&WorkoutSession) -> bool,
    ) -> Result<Vec<WorkoutSession>, StorageError> {
        let found: Vec<WorkoutSession> = {
            let guard = self.sessions.lock().map_err(lock_err)?;
            guard.values().filter(|s| keep(s)).cloned().collect()
        };
        found.into_iter().map(|s| self.with_names(s)).collect()
    }

    fn store_outcome(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
        terminated_early: bool,
    ) -> Result<(), StorageError> {
        let mut guard = self.sessions.lock().map_err(lock_err)?;
        let session = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        if session.is_template {
            return Err(StorageError::Conflict);
        }
        session.completed = true;
        session.terminated_early = terminated_early;
        session.duration_seconds = Some(duration_seconds);
        for planned in &mut session.exercises {
            if let Some(payload) = results.iter().find(|r| r.order == planned.order) {
                planned.result = Some(payload.to_result());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryRepository {
    async fn insert_exercise(
        &self,
        exercise: &ValidatedExercise,
    ) -> Result<ExerciseId, StorageError> {
        let mut guard = self.exercises.lock().map_err(lock_err)?;
        if guard.values().any(|e| e.name == exercise.name) {
            return Err(StorageError::Conflict);
        }
        let next = guard.keys().map(|id| id.value()).max().unwrap_or(0) + 1;
        let id = ExerciseId::new(next);
        guard.insert(id, exercise.clone().assign_id(id));
        Ok(id)
    }

    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        let mut guard = self.exercises.lock().map_err(lock_err)?;
        if !guard.contains_key(&exercise.id) {
            return Err(StorageError::NotFound);
        }
        if guard
            .values()
            .any(|e| e.id != exercise.id && e.name == exercise.name)
        {
            return Err(StorageError::Conflict);
        }
        guard.insert(exercise.id, exercise.clone());
        Ok(())
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError> {
        let guard = self.exercises.lock().map_err(lock_err)?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_exercise_by_name(&self, name: &str) -> Result<Option<Exercise>, StorageError> {
        let guard = self.exercises.lock().map_err(lock_err)?;
        Ok(guard.values().find(|e| e.name == name).cloned())
    }

    async fn list_exercises(&self) -> Result<Vec<Exercise>, StorageError> {
        let guard = self.exercises.lock().map_err(lock_err)?;
        let mut all: Vec<Exercise> = guard.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.value().cmp(&b.id.value())));
        Ok(all)
    }

    async fn delete_exercise(&self, id: ExerciseId) -> Result<(), StorageError> {
        let in_use = {
            let sessions = self.sessions.lock().map_err(lock_err)?;
            sessions
                .values()
                .any(|s| s.exercises.iter().any(|e| e.exercise_id == id))
        };
        if in_use {
            return Err(StorageError::Conflict);
        }
        let mut guard = self.exercises.lock().map_err(lock_err)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn insert_session(&self, session: &ValidatedSession) -> Result<SessionId, StorageError> {
        {
            let exercises = self.exercises.lock().map_err(lock_err)?;
            if session
                .exercises
                .iter()
                .any(|e| !exercises.contains_key(&e.exercise_id))
            {
                return Err(StorageError::Conflict);
            }
        }
        let mut guard = self.sessions.lock().map_err(lock_err)?;
        let next = guard.keys().map(|id| id.value()).max().unwrap_or(0) + 1;
        let id = SessionId::new(next);
        guard.insert(id, session.clone().assign_id(id));
        Ok(id)
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<WorkoutSession>, StorageError> {
        let found = {
            let guard = self.sessions.lock().map_err(lock_err)?;
            guard.get(&id).cloned()
        };
        found.map(|s| self.with_names(s)).transpose()
    }

    async fn list_sessions(&self) -> Result<Vec<WorkoutSession>, StorageError> {
        let mut found = self.collect_sessions(|s| !s.is_template)?;
        found.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.value().cmp(&a.id.value())));
        Ok(found)
    }

    async fn list_templates(&self) -> Result<Vec<WorkoutSession>, StorageError> {
        let mut found = self.collect_sessions(|s| s.is_template)?;
        found.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.value().cmp(&b.id.value())));
        Ok(found)
    }

    async fn rename_session(&self, id: SessionId, title: &str) -> Result<(), StorageError> {
        let mut guard = self.sessions.lock().map_err(lock_err)?;
        let session = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        session.title = title.to_string();
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let mut guard = self.sessions.lock().map_err(lock_err)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }

    async fn record_completion(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
    ) -> Result<(), StorageError> {
        self.store_outcome(id, duration_seconds, results, false)
    }

    async fn record_termination(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
    ) -> Result<(), StorageError> {
        self.store_outcome(id, duration_seconds, results, true)
    }

    async fn list_completed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkoutSession>, StorageError> {
        let mut found = self.collect_sessions(|s| !s.is_template && s.completed && s.date >= since)?;
        found.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.value().cmp(&b.id.value())));
        Ok(found)
    }
}

#[async_trait]
impl PhotoRepository for InMemoryRepository {
    async fn insert_photo(&self, photo: &ValidatedPhoto) -> Result<PhotoId, StorageError> {
        let mut guard = self.photos.lock().map_err(lock_err)?;
        if guard.values().any(|p| p.filename == photo.filename) {
            return Err(StorageError::Conflict);
        }
        let next = guard.keys().map(|id| id.value()).max().unwrap_or(0) + 1;
        let id = PhotoId::new(next);
        guard.insert(id, photo.clone().assign_id(id));
        Ok(id)
    }

    async fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, StorageError> {
        let guard = self.photos.lock().map_err(lock_err)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_photos(&self) -> Result<Vec<Photo>, StorageError> {
        let guard = self.photos.lock().map_err(lock_err)?;
        let mut all: Vec<Photo> = guard.values().cloned().collect();
        all.sort_by(|a, b| {
            b.capture_date
                .cmp(&a.capture_date)
                .then(b.id.value().cmp(&a.id.value()))
        });
        Ok(all)
    }

    async fn update_photo_notes(
        &self,
        id: PhotoId,
        notes: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.photos.lock().map_err(lock_err)?;
        let photo = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        photo.notes = notes.map(str::to_string);
        photo.updated_at = updated_at;
        Ok(())
    }

    async fn delete_photo(&self, id: PhotoId) -> Result<Photo, StorageError> {
        let mut guard = self.photos.lock().map_err(lock_err)?;
        guard.remove(&id).ok_or(StorageError::NotFound)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub exercises: Arc<dyn ExerciseRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub photos: Arc<dyn PhotoRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let exercises: Arc<dyn ExerciseRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let photos: Arc<dyn PhotoRepository> = Arc::new(repo);
        Self {
            exercises,
            sessions,
            photos,
        }
    }
}
