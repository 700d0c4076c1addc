use fit_core::model::SessionId;
use fit_core::workout::{
    ExercisePayload, Transition, WorkoutExecution, WorkoutPhase,
};

/// Results waiting to be written after a terminal transition.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOutcome {
    Completion {
        duration_seconds: u32,
        results: Vec<ExercisePayload>,
    },
    Termination {
        duration_seconds: u32,
        results: Vec<ExercisePayload>,
    },
}

/// Outcome of a single operation on a running workout.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutStep {
    pub transition: Option<Transition>,
    pub phase: WorkoutPhase,
    /// `true` once the final results have been stored.
    pub persisted: bool,
}

/// A workout in progress, plus its persistence bookkeeping.
///
/// Created by `WorkoutLoopService::start`; every operation goes through the
/// service so the terminal hand-off to storage happens exactly once. Not
/// `Clone`: a copy could hand off the same results a second time.
#[derive(Debug)]
pub struct WorkoutRun {
    title: String,
    execution: WorkoutExecution,
    pending: Option<PendingOutcome>,
    persisted: bool,
}

impl WorkoutRun {
    pub(crate) fn new(title: String, execution: WorkoutExecution) -> Self {
        Self {
            title,
            execution,
            pending: None,
            persisted: false,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.execution.session_id()
    }

    #[must_use]
    pub fn execution(&self) -> &WorkoutExecution {
        &self.execution
    }

    pub(crate) fn execution_mut(&mut self) -> &mut WorkoutExecution {
        &mut self.execution
    }

    #[must_use]
    pub fn phase(&self) -> WorkoutPhase {
        self.execution.phase()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.execution.is_finished()
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// A terminal hand-off failed and can be retried with `finalize`.
    #[must_use]
    pub fn needs_finalize(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn pending(&self) -> Option<&PendingOutcome> {
        self.pending.as_ref()
    }

    pub(crate) fn set_pending(&mut self, outcome: PendingOutcome) {
        if !self.persisted {
            self.pending = Some(outcome);
        }
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.pending = None;
        self.persisted = true;
    }

    pub(crate) fn step(&self, transition: Option<Transition>) -> WorkoutStep {
        WorkoutStep {
            transition,
            phase: self.phase(),
            persisted: self.persisted,
        }
    }
}
