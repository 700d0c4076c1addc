use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::exercise::{SetTarget, SetTargetError};
use crate::model::ids::{ExerciseId, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionDraftError {
    #[error("session title cannot be empty")]
    EmptyTitle,

    #[error("planned exercise at order {order} must have at least one set")]
    ZeroSets { order: u32 },

    #[error("planned exercise at order {order} has an invalid target: {source}")]
    InvalidTarget {
        order: u32,
        #[source]
        source: SetTargetError,
    },

    #[error("order {order} is used by more than one planned exercise")]
    DuplicateOrder { order: u32 },
}

/// What the user actually did for one planned exercise, as persisted.
///
/// `actual_values` holds reps (or seconds for duration-based exercises) for each
/// attempted set; `weights` is parallel to it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub actual_sets: u32,
    pub actual_values: Vec<u32>,
    pub weights: Vec<f64>,
}

/// A target attached to a session: one exercise at one position in the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedExercise {
    pub exercise_id: ExerciseId,
    /// Display name joined from the exercise library when loaded from storage.
    pub exercise_name: Option<String>,
    pub order: u32,
    pub sets: u32,
    pub target: SetTarget,
    pub rest_between_sets: u32,
    pub rest_after: u32,
    pub result: Option<ExerciseResult>,
}

impl PlannedExercise {
    /// Label used in logs and terminal output.
    #[must_use]
    pub fn label(&self) -> String {
        self.exercise_name
            .clone()
            .unwrap_or_else(|| format!("exercise #{}", self.exercise_id))
    }
}

/// Raw shape of a planned exercise as it arrives from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedExerciseDraft {
    pub exercise_id: ExerciseId,
    pub order: u32,
    pub sets: u32,
    pub reps: Option<u32>,
    pub duration_seconds: Option<u32>,
    pub rest_between_sets: u32,
    pub rest_after: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub title: String,
    pub date: DateTime<Utc>,
    pub warmup_seconds: u32,
    pub is_template: bool,
    pub exercises: Vec<PlannedExerciseDraft>,
}

impl SessionDraft {
    /// Validate the draft and sort planned exercises by `order`.
    ///
    /// An empty exercise list is accepted here; it is rejected when the session is executed.
    ///
    /// # Errors
    ///
    /// Returns `SessionDraftError` for an empty title, zero sets, an invalid
    /// reps/duration pair, or duplicate ordering.
    pub fn validate(self) -> Result<ValidatedSession, SessionDraftError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(SessionDraftError::EmptyTitle);
        }

        let mut seen = HashSet::new();
        let mut exercises = Vec::with_capacity(self.exercises.len());
        for draft in self.exercises {
            let order = draft.order;
            if !seen.insert(order) {
                return Err(SessionDraftError::DuplicateOrder { order });
            }
            if draft.sets == 0 {
                return Err(SessionDraftError::ZeroSets { order });
            }
            let target = SetTarget::from_parts(draft.reps, draft.duration_seconds)
                .map_err(|source| SessionDraftError::InvalidTarget { order, source })?;

            exercises.push(PlannedExercise {
                exercise_id: draft.exercise_id,
                exercise_name: None,
                order,
                sets: draft.sets,
                target,
                rest_between_sets: draft.rest_between_sets,
                rest_after: draft.rest_after,
                result: None,
            });
        }
        exercises.sort_by_key(|e| e.order);

        Ok(ValidatedSession {
            title,
            date: self.date,
            warmup_seconds: self.warmup_seconds,
            is_template: self.is_template,
            exercises,
        })
    }
}

/// A session plan ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSession {
    pub title: String,
    pub date: DateTime<Utc>,
    pub warmup_seconds: u32,
    pub is_template: bool,
    pub exercises: Vec<PlannedExercise>,
}

impl ValidatedSession {
    #[must_use]
    pub fn assign_id(self, id: SessionId) -> WorkoutSession {
        WorkoutSession {
            id,
            title: self.title,
            date: self.date,
            warmup_seconds: self.warmup_seconds,
            is_template: self.is_template,
            duration_seconds: None,
            completed: false,
            terminated_early: false,
            exercises: self.exercises,
        }
    }
}

/// A workout session: its plan and, once executed, its recorded results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: SessionId,
    pub title: String,
    pub date: DateTime<Utc>,
    pub warmup_seconds: u32,
    pub is_template: bool,
    pub duration_seconds: Option<u32>,
    pub completed: bool,
    pub terminated_early: bool,
    pub exercises: Vec<PlannedExercise>,
}

impl WorkoutSession {
    #[must_use]
    pub fn has_warmup(&self) -> bool {
        self.warmup_seconds > 0
    }

    #[must_use]
    pub fn total_planned_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }

    /// Copy this session's plan into a fresh, non-template session dated `date`.
    ///
    /// Recorded results and completion state are not carried over.
    #[must_use]
    pub fn instantiate(&self, date: DateTime<Utc>) -> ValidatedSession {
        ValidatedSession {
            title: self.title.clone(),
            date,
            warmup_seconds: self.warmup_seconds,
            is_template: false,
            exercises: self
                .exercises
                .iter()
                .map(|e| PlannedExercise {
                    result: None,
                    ..e.clone()
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn planned(order: u32, reps: Option<u32>, duration: Option<u32>) -> PlannedExerciseDraft {
        PlannedExerciseDraft {
            exercise_id: ExerciseId::new(u64::from(order)),
            order,
            sets: 3,
            reps,
            duration_seconds: duration,
            rest_between_sets: 60,
            rest_after: 120,
        }
    }

    fn draft(exercises: Vec<PlannedExerciseDraft>) -> SessionDraft {
        SessionDraft {
            title: " Upper body ".into(),
            date: fixed_now(),
            warmup_seconds: 300,
            is_template: true,
            exercises,
        }
    }

    #[test]
    fn validate_sorts_by_order() {
        let session = draft(vec![planned(2, Some(8), None), planned(1, None, Some(30))])
            .validate()
            .unwrap()
            .assign_id(SessionId::new(1));

        assert_eq!(session.title, "Upper body");
        assert_eq!(session.exercises[0].order, 1);
        assert_eq!(session.exercises[0].target, SetTarget::Duration(30));
        assert_eq!(session.exercises[1].target, SetTarget::Reps(8));
        assert_eq!(session.total_planned_sets(), 6);
        assert!(!session.completed);
    }

    #[test]
    fn validate_rejects_both_reps_and_duration() {
        let err = draft(vec![planned(1, Some(8), Some(30))])
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            SessionDraftError::InvalidTarget {
                order: 1,
                source: SetTargetError::Ambiguous
            }
        );
    }

    #[test]
    fn validate_rejects_duplicate_order_and_zero_sets() {
        let err = draft(vec![planned(1, Some(8), None), planned(1, Some(8), None)])
            .validate()
            .unwrap_err();
        assert_eq!(err, SessionDraftError::DuplicateOrder { order: 1 });

        let mut zero = planned(3, Some(8), None);
        zero.sets = 0;
        let err = draft(vec![zero]).validate().unwrap_err();
        assert_eq!(err, SessionDraftError::ZeroSets { order: 3 });
    }

    #[test]
    fn instantiate_clears_results_and_template_flag() {
        let mut template = draft(vec![planned(1, Some(8), None)])
            .validate()
            .unwrap()
            .assign_id(SessionId::new(9));
        template.exercises[0].result = Some(ExerciseResult {
            actual_sets: 1,
            actual_values: vec![8],
            weights: vec![0.0],
        });

        let copy = template.instantiate(fixed_now());
        assert!(!copy.is_template);
        assert_eq!(copy.exercises.len(), 1);
        assert!(copy.exercises[0].result.is_none());
    }
}
