use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ExerciseId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SetTargetError {
    #[error("a set target needs either reps or a duration")]
    Missing,

    #[error("a set target cannot have both reps and a duration")]
    Ambiguous,

    #[error("set target must be greater than zero")]
    Zero,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise name cannot be empty")]
    EmptyName,

    #[error("exercise needs at least one muscle group")]
    NoMuscleGroups,

    #[error("default sets must be > 0")]
    InvalidSets,

    #[error("default rest durations must be > 0")]
    InvalidRest,

    #[error("unknown exercise category: {0}")]
    UnknownCategory(String),

    #[error(transparent)]
    Target(#[from] SetTargetError),
}

//
// ─── SET TARGET ────────────────────────────────────────────────────────────────
//

/// What a single set aims for: a rep count or a hold duration in seconds.
///
/// Exactly one of the two exists for any exercise, so the enum replaces the
/// pair of optional columns used at the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetTarget {
    Reps(u32),
    Duration(u32),
}

impl SetTarget {
    /// Builds a target from the optional reps/duration pair found in requests and rows.
    ///
    /// # Errors
    ///
    /// Returns `SetTargetError` unless exactly one non-zero value is present.
    pub fn from_parts(reps: Option<u32>, duration_seconds: Option<u32>) -> Result<Self, SetTargetError> {
        match (reps, duration_seconds) {
            (Some(_), Some(_)) => Err(SetTargetError::Ambiguous),
            (None, None) => Err(SetTargetError::Missing),
            (Some(0), None) | (None, Some(0)) => Err(SetTargetError::Zero),
            (Some(r), None) => Ok(Self::Reps(r)),
            (None, Some(d)) => Ok(Self::Duration(d)),
        }
    }

    #[must_use]
    pub fn reps(&self) -> Option<u32> {
        match self {
            Self::Reps(r) => Some(*r),
            Self::Duration(_) => None,
        }
    }

    #[must_use]
    pub fn duration_seconds(&self) -> Option<u32> {
        match self {
            Self::Reps(_) => None,
            Self::Duration(d) => Some(*d),
        }
    }

    #[must_use]
    pub fn is_duration_based(&self) -> bool {
        matches!(self, Self::Duration(_))
    }

    /// The raw target value (reps or seconds).
    #[must_use]
    pub fn value(&self) -> u32 {
        match self {
            Self::Reps(v) | Self::Duration(v) => *v,
        }
    }
}

impl fmt::Display for SetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reps(r) => write!(f, "{r} reps"),
            Self::Duration(d) => write!(f, "{d}s"),
        }
    }
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseCategory {
    Force,
    Cardio,
}

impl ExerciseCategory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Force => "FORCE",
            Self::Cardio => "CARDIO",
        }
    }
}

impl FromStr for ExerciseCategory {
    type Err = ExerciseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FORCE" => Ok(Self::Force),
            "CARDIO" => Ok(Self::Cardio),
            _ => Err(ExerciseError::UnknownCategory(s.to_string())),
        }
    }
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── EXERCISE TYPES ────────────────────────────────────────────────────────────
//

/// Values copied into a session when the exercise is added to a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseDefaults {
    pub sets: u32,
    pub target: SetTarget,
    pub rest_between_sets: u32,
    pub rest_after: u32,
}

impl ExerciseDefaults {
    fn validate(&self) -> Result<(), ExerciseError> {
        if self.sets == 0 {
            return Err(ExerciseError::InvalidSets);
        }
        if self.rest_between_sets == 0 || self.rest_after == 0 {
            return Err(ExerciseError::InvalidRest);
        }
        if self.target.value() == 0 {
            return Err(SetTargetError::Zero.into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseDraft {
    pub name: String,
    pub category: ExerciseCategory,
    pub muscle_groups: Vec<String>,
    pub equipment_needed: Option<String>,
    pub instructions: Option<String>,
    pub is_custom: bool,
    pub defaults: ExerciseDefaults,
}

impl ExerciseDraft {
    /// Validate user input and normalize whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` for an empty name, no muscle groups, or invalid defaults.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedExercise, ExerciseError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ExerciseError::EmptyName);
        }

        let muscle_groups: Vec<String> = self
            .muscle_groups
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if muscle_groups.is_empty() {
            return Err(ExerciseError::NoMuscleGroups);
        }

        self.defaults.validate()?;

        Ok(ValidatedExercise {
            name,
            category: self.category,
            muscle_groups,
            equipment_needed: non_blank(self.equipment_needed),
            instructions: non_blank(self.instructions),
            is_custom: self.is_custom,
            defaults: self.defaults,
            created_at: now,
        })
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedExercise {
    pub name: String,
    pub category: ExerciseCategory,
    pub muscle_groups: Vec<String>,
    pub equipment_needed: Option<String>,
    pub instructions: Option<String>,
    pub is_custom: bool,
    pub defaults: ExerciseDefaults,
    pub created_at: DateTime<Utc>,
}

impl ValidatedExercise {
    #[must_use]
    pub fn assign_id(self, id: ExerciseId) -> Exercise {
        Exercise {
            id,
            name: self.name,
            category: self.category,
            muscle_groups: self.muscle_groups,
            equipment_needed: self.equipment_needed,
            instructions: self.instructions,
            is_custom: self.is_custom,
            defaults: self.defaults,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// An entry in the exercise library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub category: ExerciseCategory,
    pub muscle_groups: Vec<String>,
    pub equipment_needed: Option<String>,
    pub instructions: Option<String>,
    pub is_custom: bool,
    pub defaults: ExerciseDefaults,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exercise {
    #[must_use]
    pub fn is_duration_based(&self) -> bool {
        self.defaults.target.is_duration_based()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(target: SetTarget) -> ExerciseDraft {
        ExerciseDraft {
            name: "  Push-up ".into(),
            category: ExerciseCategory::Force,
            muscle_groups: vec!["chest".into(), " ".into(), "triceps".into()],
            equipment_needed: Some("   ".into()),
            instructions: None,
            is_custom: true,
            defaults: ExerciseDefaults {
                sets: 3,
                target,
                rest_between_sets: 60,
                rest_after: 120,
            },
        }
    }

    #[test]
    fn target_requires_exactly_one_value() {
        assert_eq!(SetTarget::from_parts(Some(10), None), Ok(SetTarget::Reps(10)));
        assert_eq!(SetTarget::from_parts(None, Some(30)), Ok(SetTarget::Duration(30)));
        assert_eq!(SetTarget::from_parts(Some(10), Some(30)), Err(SetTargetError::Ambiguous));
        assert_eq!(SetTarget::from_parts(None, None), Err(SetTargetError::Missing));
        assert_eq!(SetTarget::from_parts(Some(0), None), Err(SetTargetError::Zero));
    }

    #[test]
    fn draft_normalizes_fields() {
        let exercise = draft(SetTarget::Reps(12))
            .validate(fixed_now())
            .unwrap()
            .assign_id(ExerciseId::new(4));

        assert_eq!(exercise.name, "Push-up");
        assert_eq!(exercise.muscle_groups, vec!["chest", "triceps"]);
        assert_eq!(exercise.equipment_needed, None);
        assert!(!exercise.is_duration_based());
        assert_eq!(exercise.updated_at, exercise.created_at);
    }

    #[test]
    fn draft_rejects_blank_name_and_missing_muscles() {
        let mut d = draft(SetTarget::Reps(12));
        d.name = "   ".into();
        assert_eq!(d.validate(fixed_now()).unwrap_err(), ExerciseError::EmptyName);

        let mut d = draft(SetTarget::Reps(12));
        d.muscle_groups = vec![" ".into()];
        assert_eq!(d.validate(fixed_now()).unwrap_err(), ExerciseError::NoMuscleGroups);
    }

    #[test]
    fn draft_rejects_invalid_defaults() {
        let mut d = draft(SetTarget::Duration(30));
        d.defaults.sets = 0;
        assert_eq!(d.validate(fixed_now()).unwrap_err(), ExerciseError::InvalidSets);

        let mut d = draft(SetTarget::Duration(30));
        d.defaults.rest_after = 0;
        assert_eq!(d.validate(fixed_now()).unwrap_err(), ExerciseError::InvalidRest);

        let d = draft(SetTarget::Duration(0));
        assert_eq!(
            d.validate(fixed_now()).unwrap_err(),
            ExerciseError::Target(SetTargetError::Zero)
        );
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("cardio".parse::<ExerciseCategory>().unwrap(), ExerciseCategory::Cardio);
        assert!("yoga".parse::<ExerciseCategory>().is_err());
    }
}
