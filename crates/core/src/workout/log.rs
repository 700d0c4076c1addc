use serde::Serialize;

use crate::model::PlannedExercise;

/// Per-set performance recorded during a workout.
///
/// Both grids are sized from the plan when the workout starts: one row per
/// planned exercise, one slot per planned set. A slot holding `0` has not been
/// attempted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceLog {
    values: Vec<Vec<u32>>,
    weights: Vec<Vec<f64>>,
}

impl PerformanceLog {
    #[must_use]
    pub fn for_plan(plan: &[PlannedExercise]) -> Self {
        let slots = |e: &PlannedExercise| usize::try_from(e.sets).unwrap_or(0);
        Self {
            values: plan.iter().map(|e| vec![0; slots(e)]).collect(),
            weights: plan.iter().map(|e| vec![0.0; slots(e)]).collect(),
        }
    }

    /// Store a set at `(exercise_index, set_index)`. Returns `false` when out of range.
    pub(crate) fn record(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        value: u32,
        weight: f64,
    ) -> bool {
        let (Some(values), Some(weights)) = (
            self.values.get_mut(exercise_index),
            self.weights.get_mut(exercise_index),
        ) else {
            return false;
        };
        let (Some(v), Some(w)) = (values.get_mut(set_index), weights.get_mut(set_index)) else {
            return false;
        };
        *v = value;
        *w = weight;
        true
    }

    #[must_use]
    pub fn values(&self) -> &[Vec<u32>] {
        &self.values
    }

    #[must_use]
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    #[must_use]
    pub fn values_for(&self, exercise_index: usize) -> &[u32] {
        self.values.get(exercise_index).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn weights_for(&self, exercise_index: usize) -> &[f64] {
        self.weights.get(exercise_index).map_or(&[], Vec::as_slice)
    }

    /// Number of attempted sets (non-zero values) for one exercise.
    #[must_use]
    pub fn attempted(&self, exercise_index: usize) -> usize {
        self.values_for(exercise_index)
            .iter()
            .filter(|v| **v > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExerciseId, SetTarget};

    fn planned(sets: u32) -> PlannedExercise {
        PlannedExercise {
            exercise_id: ExerciseId::new(1),
            exercise_name: None,
            order: 1,
            sets,
            target: SetTarget::Reps(10),
            rest_between_sets: 60,
            rest_after: 90,
            result: None,
        }
    }

    #[test]
    fn grids_are_sized_from_plan() {
        let log = PerformanceLog::for_plan(&[planned(2), planned(4)]);
        assert_eq!(log.values_for(0).len(), 2);
        assert_eq!(log.weights_for(1).len(), 4);
        assert!(log.values_for(5).is_empty());
    }

    #[test]
    fn record_rejects_out_of_range_slots() {
        let mut log = PerformanceLog::for_plan(&[planned(1)]);
        assert!(log.record(0, 0, 12, 20.0));
        assert!(!log.record(0, 1, 12, 20.0));
        assert!(!log.record(3, 0, 12, 20.0));
        assert_eq!(log.attempted(0), 1);
    }

    #[test]
    fn zero_value_counts_as_unattempted() {
        let mut log = PerformanceLog::for_plan(&[planned(3)]);
        log.record(0, 0, 0, 0.0);
        log.record(0, 1, 8, 0.0);
        assert_eq!(log.attempted(0), 1);
    }
}
