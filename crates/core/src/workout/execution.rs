use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::model::{PlannedExercise, SessionId, WorkoutSession};
use crate::time::elapsed_seconds;
use crate::workout::analysis::{
    self, ExercisePayload, PartialWorkoutStats, WorkoutProgress, round_percent,
};
use crate::workout::countdown::Countdown;
use crate::workout::log::PerformanceLog;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExecutionError {
    #[error("session has no planned exercises")]
    NoExercises,

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        phase: WorkoutPhase,
        action: &'static str,
    },

    #[error("weight must be a finite, non-negative number")]
    InvalidWeight,

    #[error("set {set_number} of exercise {exercise_index} is outside the plan")]
    SetOutOfRange {
        exercise_index: usize,
        set_number: u32,
    },
}

//
// ─── PHASES & TRANSITIONS ──────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutPhase {
    WarmingUp,
    PerformingSet,
    Resting,
    Completed,
    Terminated,
}

impl WorkoutPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }
}

impl fmt::Display for WorkoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WarmingUp => "warming up",
            Self::PerformingSet => "performing a set",
            Self::Resting => "resting",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
        })
    }
}

/// Which rest interval is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestKind {
    BetweenSets,
    AfterExercise,
}

/// Results handed to persistence when the last planned set is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    pub session_id: SessionId,
    pub duration_seconds: u32,
    pub results: Vec<ExercisePayload>,
}

/// Snapshot taken when the user ends a workout early.
///
/// `payload` is `None` when nothing was attempted: such a workout is dropped
/// without a persistence call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminationReport {
    pub session_id: SessionId,
    pub duration_seconds: u32,
    pub progress: WorkoutProgress,
    pub stats: PartialWorkoutStats,
    pub payload: Option<Vec<ExercisePayload>>,
}

/// The observable effect of one operation on the state machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Transition {
    /// Warm-up is over; the first set of the first exercise is up.
    ExercisesStarted,
    RestStarted { kind: RestKind, seconds: u32 },
    RestFinished,
    Completed(CompletionReport),
    Terminated(TerminationReport),
}

//
// ─── EXECUTION STATE ───────────────────────────────────────────────────────────
//

/// Mutable state of one workout being executed.
///
/// Owns the plan, the recorded sets and the single countdown. Timing is
/// driven from outside: callers pass `now` into every operation and call
/// [`WorkoutExecution::tick`] once per second.
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutExecution {
    session_id: SessionId,
    plan: Vec<PlannedExercise>,
    warmup_seconds: u32,
    phase: WorkoutPhase,
    current_exercise_index: usize,
    current_set_number: u32,
    log: PerformanceLog,
    countdown: Countdown,
    rest_kind: Option<RestKind>,
    session_started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl WorkoutExecution {
    /// Begin executing `session` at `now`.
    ///
    /// Starts in `WarmingUp` (countdown armed, not running) when the session has a
    /// warm-up, otherwise directly in `PerformingSet` with the start time set.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::NoExercises` for an empty plan.
    pub fn start(session: &WorkoutSession, now: DateTime<Utc>) -> Result<Self, ExecutionError> {
        if session.exercises.is_empty() {
            return Err(ExecutionError::NoExercises);
        }

        let mut execution = Self {
            session_id: session.id,
            plan: session.exercises.clone(),
            warmup_seconds: session.warmup_seconds,
            phase: WorkoutPhase::WarmingUp,
            current_exercise_index: 0,
            current_set_number: 1,
            log: PerformanceLog::for_plan(&session.exercises),
            countdown: Countdown::armed(session.warmup_seconds),
            rest_kind: None,
            session_started_at: None,
            finished_at: None,
        };

        if session.warmup_seconds == 0 {
            execution.enter_exercises(now);
        }
        Ok(execution)
    }

    // Accessors
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn plan(&self) -> &[PlannedExercise] {
        &self.plan
    }

    #[must_use]
    pub fn phase(&self) -> WorkoutPhase {
        self.phase
    }

    #[must_use]
    pub fn current_exercise_index(&self) -> usize {
        self.current_exercise_index
    }

    #[must_use]
    pub fn current_set_number(&self) -> u32 {
        self.current_set_number
    }

    /// The exercise being performed, or coming up after the current rest.
    #[must_use]
    pub fn current_exercise(&self) -> Option<&PlannedExercise> {
        match self.phase {
            WorkoutPhase::PerformingSet | WorkoutPhase::Resting => {
                self.plan.get(self.current_exercise_index)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn log(&self) -> &PerformanceLog {
        &self.log
    }

    #[must_use]
    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    #[must_use]
    pub fn rest_kind(&self) -> Option<RestKind> {
        self.rest_kind
    }

    #[must_use]
    pub fn session_started_at(&self) -> Option<DateTime<Utc>> {
        self.session_started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Seconds since exercises began; warm-up time is never included.
    #[must_use]
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u32 {
        let end = self.finished_at.unwrap_or(now);
        self.session_started_at
            .map_or(0, |start| elapsed_seconds(start, end))
    }

    #[must_use]
    pub fn progress(&self) -> WorkoutProgress {
        analysis::analyze_progress(&self.plan, self.log.values(), self.log.weights())
    }

    #[must_use]
    pub fn stats(&self, now: DateTime<Utc>) -> PartialWorkoutStats {
        analysis::compute_stats(&self.progress(), &self.plan, self.elapsed_seconds(now))
    }

    /// Display-only progress in percent.
    ///
    /// With a warm-up, the warm-up fills the first half and the exercises the second.
    #[must_use]
    pub fn overall_progress(&self) -> u32 {
        let has_warmup = self.warmup_seconds > 0;
        let phases = if has_warmup { 2.0 } else { 1.0 };

        match self.phase {
            WorkoutPhase::Completed => 100,
            WorkoutPhase::WarmingUp => {
                if !has_warmup {
                    return 0;
                }
                let done = self
                    .warmup_seconds
                    .saturating_sub(self.countdown.remaining_seconds());
                round_percent(f64::from(done) / f64::from(self.warmup_seconds) / phases)
            }
            WorkoutPhase::PerformingSet | WorkoutPhase::Resting | WorkoutPhase::Terminated => {
                let Some(current) = self.plan.get(self.current_exercise_index) else {
                    return 0;
                };
                // plan lengths and indices are tiny; the casts are exact
                #[allow(clippy::cast_precision_loss)]
                let (index, count) = (self.current_exercise_index as f64, self.plan.len() as f64);
                let within =
                    f64::from(self.current_set_number - 1) / f64::from(current.sets.max(1));
                let exercise_progress = (index + within) / count;
                let base = if has_warmup { 0.5 } else { 0.0 };
                round_percent(base + exercise_progress / phases).min(100)
            }
        }
    }

    //
    // ─── WARM-UP ───────────────────────────────────────────────────────────────
    //

    /// Start the warm-up countdown.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::InvalidTransition` outside `WarmingUp`.
    pub fn begin_warmup(&mut self) -> Result<(), ExecutionError> {
        self.expect_phase(WorkoutPhase::WarmingUp, "start the warm-up")?;
        self.countdown.start();
        Ok(())
    }

    /// The user declares the warm-up done.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::InvalidTransition` outside `WarmingUp`.
    pub fn end_warmup(&mut self, now: DateTime<Utc>) -> Result<Transition, ExecutionError> {
        self.expect_phase(WorkoutPhase::WarmingUp, "end the warm-up")?;
        Ok(self.enter_exercises(now))
    }

    /// The user skips the warm-up, running or not.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::InvalidTransition` outside `WarmingUp`.
    pub fn skip_warmup(&mut self, now: DateTime<Utc>) -> Result<Transition, ExecutionError> {
        self.expect_phase(WorkoutPhase::WarmingUp, "skip the warm-up")?;
        Ok(self.enter_exercises(now))
    }

    fn enter_exercises(&mut self, now: DateTime<Utc>) -> Transition {
        self.countdown.clear();
        self.rest_kind = None;
        if self.session_started_at.is_none() {
            self.session_started_at = Some(now);
        }
        self.current_exercise_index = 0;
        self.current_set_number = 1;
        self.phase = WorkoutPhase::PerformingSet;
        Transition::ExercisesStarted
    }

    //
    // ─── SETS & REST ───────────────────────────────────────────────────────────
    //

    /// Record the set in progress and move to rest or completion.
    ///
    /// `value` is reps, or seconds for duration-based exercises.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::InvalidTransition` outside `PerformingSet`,
    /// `ExecutionError::InvalidWeight` for a negative or non-finite weight and
    /// `ExecutionError::SetOutOfRange` when the log has no slot for the set.
    pub fn record_set(
        &mut self,
        value: u32,
        weight: f64,
        now: DateTime<Utc>,
    ) -> Result<Transition, ExecutionError> {
        self.expect_phase(WorkoutPhase::PerformingSet, "record a set")?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(ExecutionError::InvalidWeight);
        }

        let index = self.current_exercise_index;
        let Some(current) = self.plan.get(index) else {
            return Err(ExecutionError::NoExercises);
        };
        let (sets, rest_between_sets, rest_after) =
            (current.sets, current.rest_between_sets, current.rest_after);

        let set_index = usize::try_from(self.current_set_number - 1).unwrap_or(usize::MAX);
        if !self.log.record(index, set_index, value, weight) {
            return Err(ExecutionError::SetOutOfRange {
                exercise_index: index,
                set_number: self.current_set_number,
            });
        }

        if self.current_set_number < sets {
            self.current_set_number += 1;
            return Ok(self.enter_rest(RestKind::BetweenSets, rest_between_sets));
        }

        if index + 1 < self.plan.len() {
            self.current_exercise_index += 1;
            self.current_set_number = 1;
            return Ok(self.enter_rest(RestKind::AfterExercise, rest_after));
        }

        Ok(self.complete(now))
    }

    fn enter_rest(&mut self, kind: RestKind, seconds: u32) -> Transition {
        self.phase = WorkoutPhase::Resting;
        self.rest_kind = Some(kind);
        self.countdown = Countdown::running(seconds);
        Transition::RestStarted { kind, seconds }
    }

    /// Cut the current rest short.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::InvalidTransition` outside `Resting`.
    pub fn skip_rest(&mut self) -> Result<Transition, ExecutionError> {
        self.expect_phase(WorkoutPhase::Resting, "skip rest")?;
        Ok(self.leave_rest())
    }

    fn leave_rest(&mut self) -> Transition {
        self.countdown.clear();
        self.rest_kind = None;
        self.phase = WorkoutPhase::PerformingSet;
        Transition::RestFinished
    }

    /// Advance the running countdown by one second.
    ///
    /// Returns the transition fired when a countdown reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        let phase = self.phase;
        match phase {
            WorkoutPhase::WarmingUp if self.countdown.tick() => Some(self.enter_exercises(now)),
            WorkoutPhase::Resting if self.countdown.tick() => Some(self.leave_rest()),
            _ => None,
        }
    }

    //
    // ─── END OF WORKOUT ────────────────────────────────────────────────────────
    //

    fn complete(&mut self, now: DateTime<Utc>) -> Transition {
        self.countdown.clear();
        self.rest_kind = None;
        self.phase = WorkoutPhase::Completed;
        self.finished_at = Some(now);

        Transition::Completed(CompletionReport {
            session_id: self.session_id,
            duration_seconds: self.elapsed_seconds(now),
            results: analysis::prepare_completion_payload(
                &self.plan,
                self.log.values(),
                self.log.weights(),
            ),
        })
    }

    /// End the workout early.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::InvalidTransition` unless performing a set or resting.
    pub fn terminate(&mut self, now: DateTime<Utc>) -> Result<Transition, ExecutionError> {
        if !matches!(
            self.phase,
            WorkoutPhase::PerformingSet | WorkoutPhase::Resting
        ) {
            return Err(ExecutionError::InvalidTransition {
                phase: self.phase,
                action: "end the workout",
            });
        }

        self.countdown.clear();
        self.rest_kind = None;
        self.phase = WorkoutPhase::Terminated;
        self.finished_at = Some(now);

        let duration_seconds = self.elapsed_seconds(now);
        let progress = self.progress();
        let stats = analysis::compute_stats(&progress, &self.plan, duration_seconds);
        let payload = analysis::has_completable_progress(&progress)
            .then(|| analysis::prepare_termination_payload(&progress));

        Ok(Transition::Terminated(TerminationReport {
            session_id: self.session_id,
            duration_seconds,
            progress,
            stats,
            payload,
        }))
    }

    fn expect_phase(
        &self,
        expected: WorkoutPhase,
        action: &'static str,
    ) -> Result<(), ExecutionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ExecutionError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExerciseId, SetTarget};
    use crate::time::{fixed_clock, fixed_now};

    fn planned(id: u64, sets: u32) -> PlannedExercise {
        PlannedExercise {
            exercise_id: ExerciseId::new(id),
            exercise_name: Some(format!("Exercise {id}")),
            order: u32::try_from(id).unwrap(),
            sets,
            target: SetTarget::Reps(10),
            rest_between_sets: 60,
            rest_after: 120,
            result: None,
        }
    }

    fn session(warmup_seconds: u32, exercises: Vec<PlannedExercise>) -> WorkoutSession {
        WorkoutSession {
            id: SessionId::new(1),
            title: "Test".into(),
            date: fixed_now(),
            warmup_seconds,
            is_template: false,
            duration_seconds: None,
            completed: false,
            terminated_early: false,
            exercises,
        }
    }

    #[test]
    fn no_warmup_starts_performing_with_start_time() {
        let exec = WorkoutExecution::start(&session(0, vec![planned(1, 2)]), fixed_now()).unwrap();
        assert_eq!(exec.phase(), WorkoutPhase::PerformingSet);
        assert_eq!(exec.session_started_at(), Some(fixed_now()));
        assert_eq!(exec.current_set_number(), 1);
        assert!(!exec.countdown().is_active());
    }

    #[test]
    fn empty_plan_is_rejected() {
        let err = WorkoutExecution::start(&session(0, vec![]), fixed_now()).unwrap_err();
        assert_eq!(err, ExecutionError::NoExercises);
    }

    #[test]
    fn warmup_countdown_waits_for_begin_then_fires_once() {
        let mut clock = fixed_clock();
        let mut exec = WorkoutExecution::start(&session(2, vec![planned(1, 1)]), clock.now()).unwrap();
        assert_eq!(exec.phase(), WorkoutPhase::WarmingUp);
        assert!(exec.session_started_at().is_none());
        assert!(exec.tick(clock.now()).is_none());

        exec.begin_warmup().unwrap();
        clock.advance_secs(1);
        assert!(exec.tick(clock.now()).is_none());
        clock.advance_secs(1);
        assert_eq!(exec.tick(clock.now()), Some(Transition::ExercisesStarted));
        assert_eq!(exec.phase(), WorkoutPhase::PerformingSet);
        assert_eq!(exec.session_started_at(), Some(clock.now()));

        clock.advance_secs(1);
        assert!(exec.tick(clock.now()).is_none());
        assert_eq!(exec.phase(), WorkoutPhase::PerformingSet);
    }

    #[test]
    fn skipping_warmup_reaches_performing_once() {
        let mut exec = WorkoutExecution::start(&session(300, vec![planned(1, 1)]), fixed_now()).unwrap();
        exec.skip_warmup(fixed_now()).unwrap();
        assert_eq!(exec.phase(), WorkoutPhase::PerformingSet);
        assert!(matches!(
            exec.skip_warmup(fixed_now()),
            Err(ExecutionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            exec.end_warmup(fixed_now()),
            Err(ExecutionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn recording_sets_walks_through_rests() {
        let mut exec =
            WorkoutExecution::start(&session(0, vec![planned(1, 2), planned(2, 1)]), fixed_now())
                .unwrap();

        let t = exec.record_set(10, 20.0, fixed_now()).unwrap();
        assert_eq!(
            t,
            Transition::RestStarted {
                kind: RestKind::BetweenSets,
                seconds: 60
            }
        );
        assert_eq!(exec.log().values_for(0), &[10, 0]);
        assert_eq!(exec.current_set_number(), 2);
        assert_eq!(exec.phase(), WorkoutPhase::Resting);

        assert!(matches!(
            exec.record_set(8, 20.0, fixed_now()),
            Err(ExecutionError::InvalidTransition { .. })
        ));

        exec.skip_rest().unwrap();
        let t = exec.record_set(8, 20.0, fixed_now()).unwrap();
        assert_eq!(
            t,
            Transition::RestStarted {
                kind: RestKind::AfterExercise,
                seconds: 120
            }
        );
        assert_eq!(exec.current_exercise_index(), 1);
        assert_eq!(exec.current_set_number(), 1);
        assert_eq!(exec.current_exercise().unwrap().exercise_id, ExerciseId::new(2));
    }

    #[test]
    fn rest_countdown_returns_to_performing() {
        let mut exec = WorkoutExecution::start(&session(0, vec![planned(1, 2)]), fixed_now()).unwrap();
        exec.record_set(10, 0.0, fixed_now()).unwrap();
        for _ in 0..59 {
            assert!(exec.tick(fixed_now()).is_none());
        }
        assert_eq!(exec.tick(fixed_now()), Some(Transition::RestFinished));
        assert_eq!(exec.phase(), WorkoutPhase::PerformingSet);
        assert!(exec.tick(fixed_now()).is_none());
    }

    #[test]
    fn last_set_completes_and_stays_completed() {
        let mut clock = fixed_clock();
        let mut exec = WorkoutExecution::start(&session(0, vec![planned(1, 1)]), clock.now()).unwrap();
        clock.advance_secs(95);

        let Transition::Completed(report) = exec.record_set(12, 10.0, clock.now()).unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(report.duration_seconds, 95);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].actual_values, vec![12]);

        assert_eq!(exec.phase(), WorkoutPhase::Completed);
        assert!(exec.tick(clock.now()).is_none());
        assert!(exec.record_set(1, 0.0, clock.now()).is_err());
        assert!(exec.terminate(clock.now()).is_err());
        assert_eq!(exec.phase(), WorkoutPhase::Completed);
        assert_eq!(exec.overall_progress(), 100);
    }

    #[test]
    fn negative_weight_is_rejected_without_side_effects() {
        let mut exec = WorkoutExecution::start(&session(0, vec![planned(1, 2)]), fixed_now()).unwrap();
        assert_eq!(
            exec.record_set(10, -1.0, fixed_now()),
            Err(ExecutionError::InvalidWeight)
        );
        assert_eq!(exec.current_set_number(), 1);
        assert_eq!(exec.log().attempted(0), 0);
    }

    #[test]
    fn terminate_with_nothing_attempted_has_no_payload() {
        let mut exec = WorkoutExecution::start(&session(60, vec![planned(1, 2)]), fixed_now()).unwrap();
        assert!(exec.terminate(fixed_now()).is_err());
        exec.skip_warmup(fixed_now()).unwrap();

        let Transition::Terminated(report) = exec.terminate(fixed_now()).unwrap() else {
            panic!("expected termination");
        };
        assert!(report.payload.is_none());
        assert_eq!(report.progress.untouched.len(), 1);
        assert_eq!(exec.phase(), WorkoutPhase::Terminated);
    }

    #[test]
    fn terminating_after_first_exercise_keeps_it_completed() {
        let mut exec =
            WorkoutExecution::start(&session(0, vec![planned(1, 2), planned(2, 2)]), fixed_now())
                .unwrap();
        assert_eq!(
            exec.record_set(10, 20.0, fixed_now()).unwrap(),
            Transition::RestStarted {
                kind: RestKind::BetweenSets,
                seconds: 60
            }
        );
        exec.skip_rest().unwrap();
        assert_eq!(
            exec.record_set(8, 20.0, fixed_now()).unwrap(),
            Transition::RestStarted {
                kind: RestKind::AfterExercise,
                seconds: 120
            }
        );
        exec.skip_rest().unwrap();
        assert_eq!(exec.current_exercise_index(), 1);

        let Transition::Terminated(report) = exec.terminate(fixed_now()).unwrap() else {
            panic!("expected termination");
        };
        assert_eq!(report.progress.completed.len(), 1);
        assert_eq!(report.progress.completed[0].planned.exercise_id, ExerciseId::new(1));
        assert!(report.progress.partial.is_empty());
        assert_eq!(report.progress.untouched.len(), 1);
        assert_eq!(report.progress.untouched[0].exercise_id, ExerciseId::new(2));

        let payload = report.payload.unwrap();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0].exercise_id, ExerciseId::new(1));
        assert_eq!(payload[0].actual_sets, 2);
        assert_eq!(payload[0].actual_values, vec![10, 8]);
        assert_eq!(payload[0].weights, vec![20.0, 20.0]);
        assert!((report.stats.total_volume - 360.0).abs() < f64::EPSILON);
        assert_eq!(report.stats.completion_percentage, 50);
    }

    #[test]
    fn set_without_a_log_slot_is_rejected_before_advancing() {
        let mut exec = WorkoutExecution::start(&session(0, vec![planned(1, 2)]), fixed_now()).unwrap();
        exec.log = PerformanceLog::for_plan(&[]);
        assert_eq!(
            exec.record_set(10, 0.0, fixed_now()),
            Err(ExecutionError::SetOutOfRange {
                exercise_index: 0,
                set_number: 1
            })
        );
        assert_eq!(exec.phase(), WorkoutPhase::PerformingSet);
        assert_eq!(exec.current_set_number(), 1);
    }

    #[test]
    fn terminate_while_resting_clears_countdown() {
        let mut exec = WorkoutExecution::start(&session(0, vec![planned(1, 3)]), fixed_now()).unwrap();
        exec.record_set(10, 0.0, fixed_now()).unwrap();
        assert!(exec.countdown().is_active());

        let Transition::Terminated(report) = exec.terminate(fixed_now()).unwrap() else {
            panic!("expected termination");
        };
        assert!(!exec.countdown().is_active());
        assert!(exec.tick(fixed_now()).is_none());
        let payload = report.payload.unwrap();
        assert_eq!(payload[0].actual_sets, 1);
        assert_eq!(report.progress.partial.len(), 1);
    }

    #[test]
    fn skipping_rest_does_not_move_start_time() {
        let mut clock = fixed_clock();
        let mut exec = WorkoutExecution::start(&session(0, vec![planned(1, 2)]), clock.now()).unwrap();
        let started = exec.session_started_at();
        exec.record_set(10, 0.0, clock.now()).unwrap();
        for _ in 0..15 {
            exec.tick(clock.now());
            clock.advance_secs(1);
        }
        assert_eq!(exec.countdown().remaining_seconds(), 45);
        assert_eq!(exec.skip_rest().unwrap(), Transition::RestFinished);
        assert_eq!(exec.phase(), WorkoutPhase::PerformingSet);
        assert_eq!(exec.session_started_at(), started);
        assert_eq!(exec.elapsed_seconds(clock.now()), 15);
    }

    #[test]
    fn overall_progress_splits_warmup_and_exercises() {
        let mut exec =
            WorkoutExecution::start(&session(100, vec![planned(1, 2), planned(2, 2)]), fixed_now())
                .unwrap();
        assert_eq!(exec.overall_progress(), 0);
        exec.begin_warmup().unwrap();
        for _ in 0..50 {
            exec.tick(fixed_now());
        }
        assert_eq!(exec.overall_progress(), 25);

        exec.end_warmup(fixed_now()).unwrap();
        assert_eq!(exec.overall_progress(), 50);
        exec.record_set(10, 0.0, fixed_now()).unwrap();
        // (0 + 1/2) / 2 = 0.25 of the exercise half
        assert_eq!(exec.overall_progress(), 63);
    }

    #[test]
    fn overall_progress_without_warmup_uses_full_range() {
        let mut exec =
            WorkoutExecution::start(&session(0, vec![planned(1, 1), planned(2, 1)]), fixed_now())
                .unwrap();
        assert_eq!(exec.overall_progress(), 0);
        exec.record_set(10, 0.0, fixed_now()).unwrap();
        assert_eq!(exec.overall_progress(), 50);
    }

    #[test]
    fn transitions_serialize_with_an_event_tag() {
        let t = Transition::RestStarted {
            kind: RestKind::AfterExercise,
            seconds: 90,
        };
        assert_eq!(
            serde_json::to_value(&t).unwrap(),
            serde_json::json!({"event": "rest_started", "kind": "after_exercise", "seconds": 90})
        );
        assert_eq!(
            serde_json::to_value(Transition::ExercisesStarted).unwrap(),
            serde_json::json!({"event": "exercises_started"})
        );
    }
}
