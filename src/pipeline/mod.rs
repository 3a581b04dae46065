pub mod state;
pub mod orchestrator;

pub use orchestrator::ReportOrchestrator;
pub use state::{RunOutcome, RunPlan, RunRequest, RunStage, RunState, RunStatus};
