use std::sync::Arc;

use storage::repository::Storage;
use storage::seed::{SeedReport, seed_defaults};

use crate::Clock;
use crate::analytics::AnalyticsService;
use crate::error::AppServicesError;
use crate::exercise_service::ExerciseService;
use crate::photo_service::PhotoService;
use crate::plan_service::SessionPlanService;
use crate::workouts::WorkoutLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    seeded: Option<SeedReport>,
    exercises: Arc<ExerciseService>,
    plans: Arc<SessionPlanService>,
    workouts: Arc<WorkoutLoopService>,
    analytics: Arc<AnalyticsService>,
    photos: Arc<PhotoService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or seeding fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock).await
    }

    /// Build services over an existing storage aggregate, seeding the default
    /// library when it is empty.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the library check or seeding fails.
    pub async fn from_storage(storage: Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let seeded = ensure_default_library(&storage, clock).await?;

        let exercises = Arc::new(ExerciseService::new(clock, Arc::clone(&storage.exercises)));
        let plans = Arc::new(SessionPlanService::new(
            clock,
            Arc::clone(&storage.exercises),
            Arc::clone(&storage.sessions),
        ));
        let workouts = Arc::new(WorkoutLoopService::new(clock, Arc::clone(&storage.sessions)));
        let analytics = Arc::new(AnalyticsService::new(
            clock,
            Arc::clone(&storage.exercises),
            Arc::clone(&storage.sessions),
        ));
        let photos = Arc::new(PhotoService::new(clock, Arc::clone(&storage.photos)));

        Ok(Self {
            seeded,
            exercises,
            plans,
            workouts,
            analytics,
            photos,
        })
    }

    /// What was inserted on startup, if the library was empty.
    #[must_use]
    pub fn seeded(&self) -> Option<SeedReport> {
        self.seeded
    }

    #[must_use]
    pub fn exercises(&self) -> Arc<ExerciseService> {
        Arc::clone(&self.exercises)
    }

    #[must_use]
    pub fn plans(&self) -> Arc<SessionPlanService> {
        Arc::clone(&self.plans)
    }

    #[must_use]
    pub fn workouts(&self) -> Arc<WorkoutLoopService> {
        Arc::clone(&self.workouts)
    }

    #[must_use]
    pub fn analytics(&self) -> Arc<AnalyticsService> {
        Arc::clone(&self.analytics)
    }

    #[must_use]
    pub fn photos(&self) -> Arc<PhotoService> {
        Arc::clone(&self.photos)
    }
}

async fn ensure_default_library(
    storage: &Storage,
    clock: Clock,
) -> Result<Option<SeedReport>, AppServicesError> {
    if !storage.exercises.list_exercises().await?.is_empty() {
        return Ok(None);
    }

    let report = seed_defaults(storage, clock.now()).await?;
    tracing::info!(
        exercises = report.exercises_added,
        templates = report.templates_added,
        "seeded default exercise library"
    );
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fit_core::time::fixed_clock;

    #[tokio::test]
    async fn empty_storage_is_seeded_once() {
        let storage = Storage::in_memory();
        let services = AppServices::from_storage(storage.clone(), fixed_clock())
            .await
            .unwrap();
        let report = services.seeded().unwrap();
        assert!(report.exercises_added > 0);
        assert_eq!(report.templates_added, 3);

        let again = AppServices::from_storage(storage, fixed_clock()).await.unwrap();
        assert!(again.seeded().is_none());
        assert_eq!(again.plans().list_templates().await.unwrap().len(), 3);
    }
}
