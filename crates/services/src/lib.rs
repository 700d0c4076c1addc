#![forbid(unsafe_code)]

pub mod analytics;
pub mod app_services;
pub mod error;
pub mod exercise_service;
pub mod photo_service;
pub mod plan_service;
pub mod workouts;

pub use fit_core::Clock;

pub use analytics::{
    AnalyticsService, DateRange, DurationHistory, DurationPoint, ExerciseProgression,
    FrequencyStats, HistoryExercise, ProgressionPoint, ProgressionTrends, percentage_change,
};
pub use app_services::AppServices;
pub use error::{
    AnalyticsError, AppServicesError, ExerciseServiceError, PhotoServiceError, PlanServiceError,
    WorkoutError,
};
pub use exercise_service::ExerciseService;
pub use photo_service::{PhotoGroup, PhotoService, TimelineGrouping, group_photos};
pub use plan_service::{SessionPlanService, planned_from_defaults};
pub use workouts::{PendingOutcome, WorkoutLoopService, WorkoutRun, WorkoutStep};
