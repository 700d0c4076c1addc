//! Pure progress analysis over a workout's recorded sets.
//!
//! These functions never look at the phase or the clock: they take the plan
//! and the per-set grids (as kept by `PerformanceLog`) and derive snapshots.

use serde::{Deserialize, Serialize};

use crate::model::{ExerciseId, ExerciseResult, PlannedExercise};

//
// ─── SNAPSHOTS ─────────────────────────────────────────────────────────────────
//

/// A planned exercise together with the sets that were actually attempted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseOutcome {
    /// Index of the exercise in the plan.
    pub position: usize,
    pub planned: PlannedExercise,
    pub actual_sets: u32,
    pub actual_values: Vec<u32>,
    pub weights: Vec<f64>,
}

impl ExerciseOutcome {
    /// Σ(value × weight) over the attempted sets.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.actual_values
            .iter()
            .zip(&self.weights)
            .map(|(v, w)| f64::from(*v) * w)
            .sum()
    }
}

/// Partition of the plan into completed, partial and untouched exercises.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WorkoutProgress {
    pub completed: Vec<ExerciseOutcome>,
    pub partial: Vec<ExerciseOutcome>,
    pub untouched: Vec<PlannedExercise>,
    pub total_completed_sets: u32,
}

impl WorkoutProgress {
    #[must_use]
    pub fn total_exercises(&self) -> usize {
        self.completed.len() + self.partial.len() + self.untouched.len()
    }

    /// Completed then partial outcomes, in that order.
    pub fn attempted(&self) -> impl Iterator<Item = &ExerciseOutcome> {
        self.completed.iter().chain(self.partial.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialWorkoutStats {
    pub exercises_completed: u32,
    pub total_exercises: u32,
    pub sets_completed: u32,
    pub total_planned_sets: u32,
    pub actual_duration_seconds: u32,
    pub total_volume: f64,
    pub completion_percentage: u32,
}

/// Per-exercise results in the shape the persistence layer stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePayload {
    pub exercise_id: ExerciseId,
    pub order: u32,
    pub actual_sets: u32,
    pub actual_values: Vec<u32>,
    pub weights: Vec<f64>,
}

impl ExercisePayload {
    #[must_use]
    pub fn to_result(&self) -> ExerciseResult {
        ExerciseResult {
            actual_sets: self.actual_sets,
            actual_values: self.actual_values.clone(),
            weights: self.weights.clone(),
        }
    }
}

//
// ─── ANALYSIS ──────────────────────────────────────────────────────────────────
//

/// Attempted `(value, weight)` pairs for one exercise. Weights stay aligned with values.
fn attempted_sets(values: &[u32], weights: &[f64]) -> (Vec<u32>, Vec<f64>) {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0)
        .map(|(i, v)| (*v, weights.get(i).copied().unwrap_or(0.0)))
        .unzip()
}

// `fraction` is finite and non-negative at every call site.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn round_percent(fraction: f64) -> u32 {
    (fraction * 100.0).round() as u32
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Classify every planned exercise by how many of its sets were attempted.
///
/// A set whose recorded value is `0` counts as not attempted, even if it was
/// explicitly logged that way.
#[must_use]
pub fn analyze_progress(
    plan: &[PlannedExercise],
    values: &[Vec<u32>],
    weights: &[Vec<f64>],
) -> WorkoutProgress {
    let mut progress = WorkoutProgress::default();

    for (position, planned) in plan.iter().enumerate() {
        let row_values = values.get(position).map_or(&[][..], Vec::as_slice);
        let row_weights = weights.get(position).map_or(&[][..], Vec::as_slice);
        let (actual_values, actual_weights) = attempted_sets(row_values, row_weights);
        let attempted = count_u32(actual_values.len());

        if attempted == 0 {
            progress.untouched.push(planned.clone());
            continue;
        }

        let outcome = ExerciseOutcome {
            position,
            planned: planned.clone(),
            actual_sets: attempted,
            actual_values,
            weights: actual_weights,
        };
        progress.total_completed_sets += attempted;
        if attempted >= planned.sets {
            progress.completed.push(outcome);
        } else {
            progress.partial.push(outcome);
        }
    }

    progress
}

/// Aggregate statistics for a (possibly unfinished) workout.
///
/// `completion_percentage` is `0` when the plan has no sets at all.
#[must_use]
pub fn compute_stats(
    progress: &WorkoutProgress,
    plan: &[PlannedExercise],
    elapsed_seconds: u32,
) -> PartialWorkoutStats {
    let total_planned_sets: u32 = plan.iter().map(|e| e.sets).sum();
    let sets_completed = progress.total_completed_sets;
    let total_volume = progress.attempted().map(ExerciseOutcome::volume).sum();

    let completion_percentage = if total_planned_sets == 0 {
        0
    } else {
        round_percent(f64::from(sets_completed) / f64::from(total_planned_sets))
    };

    PartialWorkoutStats {
        exercises_completed: count_u32(progress.completed.len()),
        total_exercises: count_u32(plan.len()),
        sets_completed,
        total_planned_sets,
        actual_duration_seconds: elapsed_seconds,
        total_volume,
        completion_percentage,
    }
}

#[must_use]
pub fn has_completable_progress(progress: &WorkoutProgress) -> bool {
    !progress.completed.is_empty() || !progress.partial.is_empty()
}

/// Flatten completed and partial exercises into persistence payloads.
#[must_use]
pub fn prepare_termination_payload(progress: &WorkoutProgress) -> Vec<ExercisePayload> {
    progress
        .attempted()
        .map(|o| ExercisePayload {
            exercise_id: o.planned.exercise_id,
            order: o.planned.order,
            actual_sets: o.actual_sets,
            actual_values: o.actual_values.clone(),
            weights: o.weights.clone(),
        })
        .collect()
}

/// Payloads for every planned exercise, used when a workout runs to completion.
#[must_use]
pub fn prepare_completion_payload(
    plan: &[PlannedExercise],
    values: &[Vec<u32>],
    weights: &[Vec<f64>],
) -> Vec<ExercisePayload> {
    plan.iter()
        .enumerate()
        .map(|(position, planned)| {
            let row_values = values.get(position).map_or(&[][..], Vec::as_slice);
            let row_weights = weights.get(position).map_or(&[][..], Vec::as_slice);
            let (actual_values, actual_weights) = attempted_sets(row_values, row_weights);
            ExercisePayload {
                exercise_id: planned.exercise_id,
                order: planned.order,
                actual_sets: count_u32(actual_values.len()),
                actual_values,
                weights: actual_weights,
            }
        })
        .collect()
}

//
// ─── FORMATTING ────────────────────────────────────────────────────────────────
//

/// `"1h 2m 3s"` above an hour, `"2m 3s"` otherwise.
#[must_use]
pub fn format_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else {
        format!("{minutes}m {secs}s")
    }
}

/// Countdown display, `m:ss`.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One-line summary shown before confirming an early termination.
#[must_use]
pub fn termination_summary(stats: &PartialWorkoutStats) -> String {
    if stats.exercises_completed == 0 {
        return format!(
            "Workout ended with {} sets completed across {} exercises",
            stats.sets_completed, stats.total_exercises
        );
    }
    format!(
        "{} of {} exercises completed ({}% of planned workout)",
        stats.exercises_completed, stats.total_exercises, stats.completion_percentage
    )
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SetTarget;

    fn planned(id: u64, sets: u32) -> PlannedExercise {
        PlannedExercise {
            exercise_id: ExerciseId::new(id),
            exercise_name: None,
            order: u32::try_from(id).unwrap(),
            sets,
            target: SetTarget::Reps(10),
            rest_between_sets: 60,
            rest_after: 120,
            result: None,
        }
    }

    #[test]
    fn partitions_every_exercise_exactly_once() {
        let plan = vec![planned(1, 2), planned(2, 3), planned(3, 2)];
        let values = vec![vec![10, 8], vec![12, 0, 0], vec![0, 0]];
        let weights = vec![vec![20.0, 20.0], vec![5.0, 0.0, 0.0], vec![0.0, 0.0]];

        let progress = analyze_progress(&plan, &values, &weights);

        assert_eq!(progress.completed.len(), 1);
        assert_eq!(progress.partial.len(), 1);
        assert_eq!(progress.untouched.len(), 1);
        assert_eq!(progress.total_exercises(), plan.len());
        assert_eq!(progress.total_completed_sets, 3);
        assert_eq!(progress.partial[0].actual_values, vec![12]);
        assert_eq!(progress.partial[0].weights, vec![5.0]);
    }

    #[test]
    fn weights_stay_aligned_with_attempted_values() {
        let plan = vec![planned(1, 3)];
        let values = vec![vec![10, 0, 6]];
        let weights = vec![vec![0.0, 15.0, 12.5]];

        let progress = analyze_progress(&plan, &values, &weights);
        let outcome = &progress.partial[0];
        assert_eq!(outcome.actual_values, vec![10, 6]);
        assert_eq!(outcome.weights, vec![0.0, 12.5]);
        assert!((outcome.volume() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_sum_volume_over_completed_and_partial() {
        let plan = vec![planned(1, 2), planned(2, 2)];
        let values = vec![vec![10, 8], vec![5, 0]];
        let weights = vec![vec![20.0, 20.0], vec![10.0, 0.0]];

        let progress = analyze_progress(&plan, &values, &weights);
        let stats = compute_stats(&progress, &plan, 600);

        assert_eq!(stats.exercises_completed, 1);
        assert_eq!(stats.total_exercises, 2);
        assert_eq!(stats.sets_completed, 3);
        assert_eq!(stats.total_planned_sets, 4);
        assert_eq!(stats.completion_percentage, 75);
        assert_eq!(stats.actual_duration_seconds, 600);
        assert!((stats.total_volume - 410.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_planned_sets_yield_zero_percent() {
        let progress = analyze_progress(&[], &[], &[]);
        let stats = compute_stats(&progress, &[], 0);
        assert_eq!(stats.completion_percentage, 0);
        assert_eq!(stats.total_exercises, 0);
    }

    #[test]
    fn completable_only_with_attempted_sets() {
        let plan = vec![planned(1, 2)];
        let untouched = analyze_progress(&plan, &[vec![0, 0]], &[vec![0.0, 0.0]]);
        assert!(!has_completable_progress(&untouched));
        assert!(prepare_termination_payload(&untouched).is_empty());

        let partial = analyze_progress(&plan, &[vec![4, 0]], &[vec![0.0, 0.0]]);
        assert!(has_completable_progress(&partial));
        let payload = prepare_termination_payload(&partial);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0].actual_sets, 1);
        assert_eq!(payload[0].exercise_id, ExerciseId::new(1));
    }

    #[test]
    fn completion_payload_covers_untouched_exercises() {
        let plan = vec![planned(1, 1), planned(2, 1)];
        let payload = prepare_completion_payload(&plan, &[vec![5], vec![0]], &[vec![0.0], vec![0.0]]);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[1].actual_sets, 0);
        assert!(payload[1].actual_values.is_empty());
    }

    #[test]
    fn durations_format_like_the_history_view() {
        assert_eq!(format_duration(45), "0m 45s");
        assert_eq!(format_duration(3_725), "1h 2m 5s");
        assert_eq!(format_clock(65), "1:05");
    }

    #[test]
    fn termination_summary_depends_on_completed_exercises() {
        let plan = vec![planned(1, 2), planned(2, 2)];
        let none_done = compute_stats(
            &analyze_progress(&plan, &[vec![3, 0], vec![0, 0]], &[vec![0.0, 0.0], vec![0.0, 0.0]]),
            &plan,
            0,
        );
        assert_eq!(
            termination_summary(&none_done),
            "Workout ended with 1 sets completed across 2 exercises"
        );

        let one_done = compute_stats(
            &analyze_progress(&plan, &[vec![3, 3], vec![0, 0]], &[vec![0.0, 0.0], vec![0.0, 0.0]]),
            &plan,
            0,
        );
        assert_eq!(
            termination_summary(&one_done),
            "1 of 2 exercises completed (50% of planned workout)"
        );
    }
}
