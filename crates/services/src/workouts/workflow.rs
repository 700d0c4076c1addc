use std::sync::Arc;

use fit_core::model::SessionId;
use fit_core::workout::{Transition, WorkoutExecution};
use storage::repository::SessionRepository;

use super::run::{PendingOutcome, WorkoutRun, WorkoutStep};
use crate::Clock;
use crate::error::WorkoutError;

/// Drives workout execution and hands final results to storage.
///
/// The execution state machine never touches storage; this service turns its
/// terminal transitions into exactly one `record_completion` or
/// `record_termination` call per run.
#[derive(Clone)]
pub struct WorkoutLoopService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
}

impl WorkoutLoopService {
    #[must_use]
    pub fn new(clock: Clock, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { clock, sessions }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Load a session and begin executing it.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError::SessionNotFound`, `Template` or
    /// `AlreadyCompleted` when the session cannot be run, and
    /// `WorkoutError::Execution` for an empty plan.
    pub async fn start(&self, session_id: SessionId) -> Result<WorkoutRun, WorkoutError> {
        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(WorkoutError::SessionNotFound(session_id))?;
        if session.is_template {
            return Err(WorkoutError::Template(session_id));
        }
        if session.completed {
            return Err(WorkoutError::AlreadyCompleted(session_id));
        }

        let execution = WorkoutExecution::start(&session, self.clock.now())?;
        tracing::info!(
            session_id = %session_id,
            exercises = session.exercises.len(),
            warmup_seconds = session.warmup_seconds,
            phase = %execution.phase(),
            "workout started"
        );
        Ok(WorkoutRun::new(session.title, execution))
    }

    /// # Errors
    ///
    /// Returns `WorkoutError::Execution` outside the warm-up.
    pub fn begin_warmup(&self, run: &mut WorkoutRun) -> Result<WorkoutStep, WorkoutError> {
        run.execution_mut().begin_warmup()?;
        Ok(run.step(None))
    }

    /// # Errors
    ///
    /// Returns `WorkoutError::Execution` outside the warm-up.
    pub fn end_warmup(&self, run: &mut WorkoutRun) -> Result<WorkoutStep, WorkoutError> {
        let transition = run.execution_mut().end_warmup(self.clock.now())?;
        Ok(run.step(Some(transition)))
    }

    /// # Errors
    ///
    /// Returns `WorkoutError::Execution` outside the warm-up.
    pub fn skip_warmup(&self, run: &mut WorkoutRun) -> Result<WorkoutStep, WorkoutError> {
        let transition = run.execution_mut().skip_warmup(self.clock.now())?;
        tracing::debug!(session_id = %run.session_id(), "warm-up skipped");
        Ok(run.step(Some(transition)))
    }

    /// # Errors
    ///
    /// Returns `WorkoutError::Execution` unless resting.
    pub fn skip_rest(&self, run: &mut WorkoutRun) -> Result<WorkoutStep, WorkoutError> {
        let transition = run.execution_mut().skip_rest()?;
        Ok(run.step(Some(transition)))
    }

    /// Advance the running countdown by one second.
    #[must_use]
    pub fn tick(&self, run: &mut WorkoutRun) -> WorkoutStep {
        let transition = run.execution_mut().tick(self.clock.now());
        if let Some(t) = &transition {
            tracing::debug!(session_id = %run.session_id(), transition = ?t, "countdown finished");
        }
        run.step(transition)
    }

    /// Record the current set; persists results when it was the last one.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError::Execution` for invalid input or phase, and
    /// `WorkoutError::Storage` if the completion hand-off fails. In that case
    /// the run is already `Completed` and [`Self::finalize`] retries the write.
    pub async fn record_set(
        &self,
        run: &mut WorkoutRun,
        value: u32,
        weight: f64,
    ) -> Result<WorkoutStep, WorkoutError> {
        let transition = run
            .execution_mut()
            .record_set(value, weight, self.clock.now())?;

        if let Transition::Completed(report) = &transition {
            tracing::info!(
                session_id = %report.session_id,
                duration_seconds = report.duration_seconds,
                "workout completed"
            );
            run.set_pending(PendingOutcome::Completion {
                duration_seconds: report.duration_seconds,
                results: report.results.clone(),
            });
            self.hand_off(run).await?;
        }
        Ok(run.step(Some(transition)))
    }

    /// End the workout early.
    ///
    /// Results are persisted only when at least one set was recorded.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError::Execution` unless performing a set or resting,
    /// and `WorkoutError::Storage` if the hand-off fails (retry with
    /// [`Self::finalize`]).
    pub async fn terminate(&self, run: &mut WorkoutRun) -> Result<WorkoutStep, WorkoutError> {
        let transition = run.execution_mut().terminate(self.clock.now())?;

        if let Transition::Terminated(report) = &transition {
            tracing::info!(
                session_id = %report.session_id,
                duration_seconds = report.duration_seconds,
                sets_completed = report.stats.sets_completed,
                completion_percentage = report.stats.completion_percentage,
                "workout terminated early"
            );
            match &report.payload {
                Some(results) => {
                    run.set_pending(PendingOutcome::Termination {
                        duration_seconds: report.duration_seconds,
                        results: results.clone(),
                    });
                    self.hand_off(run).await?;
                }
                None => {
                    tracing::info!(
                        session_id = %report.session_id,
                        "no sets recorded; nothing to persist"
                    );
                }
            }
        }
        Ok(run.step(Some(transition)))
    }

    /// Retry a failed terminal hand-off.
    ///
    /// Returns `true` when results are stored, `false` for a terminated run
    /// that had nothing to store.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError::NotFinished` for a running workout and
    /// `WorkoutError::Storage` if the write fails again.
    pub async fn finalize(&self, run: &mut WorkoutRun) -> Result<bool, WorkoutError> {
        if run.is_persisted() {
            return Ok(true);
        }
        if !run.is_finished() {
            return Err(WorkoutError::NotFinished);
        }
        self.hand_off(run).await
    }

    async fn hand_off(&self, run: &mut WorkoutRun) -> Result<bool, WorkoutError> {
        let session_id = run.session_id();
        let result = match run.pending() {
            None => return Ok(run.is_persisted()),
            Some(PendingOutcome::Completion {
                duration_seconds,
                results,
            }) => {
                self.sessions
                    .record_completion(session_id, *duration_seconds, results)
                    .await
            }
            Some(PendingOutcome::Termination {
                duration_seconds,
                results,
            }) => {
                self.sessions
                    .record_termination(session_id, *duration_seconds, results)
                    .await
            }
        };

        match result {
            Ok(()) => {
                run.mark_persisted();
                tracing::info!(session_id = %session_id, "workout results stored");
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %err,
                    "storing workout results failed; retry with finalize"
                );
                Err(err.into())
            }
        }
    }
}
