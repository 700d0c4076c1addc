mod analysis;
mod countdown;
mod execution;
mod log;

pub use analysis::{
    ExerciseOutcome, ExercisePayload, PartialWorkoutStats, WorkoutProgress, analyze_progress,
    compute_stats, format_clock, format_duration, has_completable_progress,
    prepare_completion_payload, prepare_termination_payload, termination_summary,
};
pub use countdown::Countdown;
pub use execution::{
    CompletionReport, ExecutionError, RestKind, TerminationReport, Transition, WorkoutExecution,
    WorkoutPhase,
};
pub use log::PerformanceLog;
