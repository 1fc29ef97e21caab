mod drain;
mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use drain::drain_lines;
pub use orchestrator::Orchestrator;
pub use types::{
    ComponentState, DrainEnd, DrainReport, OrchestratorState, RunOutcome, DRAIN_COMPONENT,
    LND_COMPONENT,
};
