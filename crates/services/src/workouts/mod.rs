mod run;
mod workflow;

pub use run::{PendingOutcome, WorkoutRun, WorkoutStep};
pub use workflow::WorkoutLoopService;
