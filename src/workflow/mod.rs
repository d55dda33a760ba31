mod context;
mod orchestrator;
mod scenario;
mod step;

pub use context::{Context, ContextError, ContextValue, TOKEN_KEY};
pub use orchestrator::{Orchestrator, ScenarioRun, StepOutcome};
pub use scenario::Scenario;
pub use step::{Capture, Step};
