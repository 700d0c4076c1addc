//! Default exercise library and starter templates.

use chrono::{DateTime, Utc};
use fit_core::model::{
    ExerciseCategory, ExerciseDefaults, ExerciseDraft, ExerciseError, PlannedExerciseDraft,
    SessionDraft, SessionDraftError, SetTarget,
};
use thiserror::Error;

use crate::repository::{Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Exercise(#[from] ExerciseError),

    #[error(transparent)]
    Session(#[from] SessionDraftError),

    #[error("template references unknown exercise: {0}")]
    MissingExercise(&'static str),
}

/// What a seeding pass actually inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub exercises_added: u32,
    pub templates_added: u32,
}

struct LibraryEntry {
    name: &'static str,
    muscles: &'static [&'static str],
    sets: u32,
    target: SetTarget,
    rest_between_sets: u32,
    rest_after: u32,
}

const LIBRARY: &[LibraryEntry] = &[
    LibraryEntry {
        name: "Push-ups",
        muscles: &["chest", "shoulders", "triceps"],
        sets: 3,
        target: SetTarget::Reps(12),
        rest_between_sets: 60,
        rest_after: 120,
    },
    LibraryEntry {
        name: "Wall push-ups",
        muscles: &["chest", "triceps"],
        sets: 3,
        target: SetTarget::Reps(15),
        rest_between_sets: 45,
        rest_after: 90,
    },
    LibraryEntry {
        name: "Squats",
        muscles: &["quadriceps", "glutes"],
        sets: 3,
        target: SetTarget::Reps(15),
        rest_between_sets: 60,
        rest_after: 120,
    },
    LibraryEntry {
        name: "Pull-ups",
        muscles: &["back", "biceps"],
        sets: 3,
        target: SetTarget::Reps(8),
        rest_between_sets: 90,
        rest_after: 120,
    },
    LibraryEntry {
        name: "Crunches",
        muscles: &["abs"],
        sets: 3,
        target: SetTarget::Reps(20),
        rest_between_sets: 45,
        rest_after: 90,
    },
    LibraryEntry {
        name: "Plank",
        muscles: &["abs"],
        sets: 3,
        target: SetTarget::Duration(30),
        rest_between_sets: 60,
        rest_after: 120,
    },
];

struct TemplateEntry {
    title: &'static str,
    warmup_seconds: u32,
    // (exercise name, order); targets come from the library defaults
    exercises: &'static [(&'static str, u32)],
}

const TEMPLATES: &[TemplateEntry] = &[
    TemplateEntry {
        title: "Upper body strength",
        warmup_seconds: 300,
        exercises: &[("Push-ups", 1), ("Pull-ups", 2), ("Wall push-ups", 3)],
    },
    TemplateEntry {
        title: "Lower body power",
        warmup_seconds: 300,
        exercises: &[("Squats", 1), ("Crunches", 2)],
    },
    TemplateEntry {
        title: "Explosive core",
        warmup_seconds: 180,
        exercises: &[("Plank", 1), ("Crunches", 2)],
    },
];

/// Drafts for the built-in exercise library.
#[must_use]
pub fn default_exercises() -> Vec<ExerciseDraft> {
    LIBRARY
        .iter()
        .map(|entry| ExerciseDraft {
            name: entry.name.to_string(),
            category: ExerciseCategory::Force,
            muscle_groups: entry.muscles.iter().map(ToString::to_string).collect(),
            equipment_needed: None,
            instructions: None,
            is_custom: false,
            defaults: ExerciseDefaults {
                sets: entry.sets,
                target: entry.target,
                rest_between_sets: entry.rest_between_sets,
                rest_after: entry.rest_after,
            },
        })
        .collect()
}

/// Insert library exercises and templates that are not present yet.
///
/// Exercises are matched by name and templates by title, so running this
/// twice adds nothing the second time.
///
/// # Errors
///
/// Returns `SeedError` if validation or a storage call fails.
pub async fn seed_defaults(storage: &Storage, now: DateTime<Utc>) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for draft in default_exercises() {
        if storage.exercises.find_exercise_by_name(&draft.name).await?.is_some() {
            continue;
        }
        let validated = draft.validate(now)?;
        storage.exercises.insert_exercise(&validated).await?;
        report.exercises_added += 1;
    }

    let existing = storage.sessions.list_templates().await?;
    for template in TEMPLATES {
        if existing.iter().any(|t| t.title == template.title) {
            continue;
        }

        let mut planned = Vec::with_capacity(template.exercises.len());
        for (name, order) in template.exercises {
            let exercise = storage
                .exercises
                .find_exercise_by_name(name)
                .await?
                .ok_or(SeedError::MissingExercise(*name))?;
            let defaults = exercise.defaults;
            planned.push(PlannedExerciseDraft {
                exercise_id: exercise.id,
                order: *order,
                sets: defaults.sets,
                reps: defaults.target.reps(),
                duration_seconds: defaults.target.duration_seconds(),
                rest_between_sets: defaults.rest_between_sets,
                rest_after: defaults.rest_after,
            });
        }

        let session = SessionDraft {
            title: template.title.to_string(),
            date: now,
            warmup_seconds: template.warmup_seconds,
            is_template: true,
            exercises: planned,
        }
        .validate()?;
        storage.sessions.insert_session(&session).await?;
        report.templates_added += 1;
    }

    Ok(report)
}
