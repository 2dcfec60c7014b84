pub mod cancel;
pub mod executor;
pub mod plan;
pub mod resolve;
pub mod run;
pub mod runner;

pub use cancel::CancellationToken;
pub use executor::{Scheduler, SchedulerOptions};
pub use plan::{
    dedupe_directives, drop_covered, ExecutionResult, Outcome, Resolution, ResolvedDirective, RunSummary,
};
pub use resolve::{resolve_all, resolve_directive};
pub use run::{DirectiveState, Orchestrator, OrchestratorOptions, StatusEntry, StatusReport};
pub use runner::{CommandRunner, GeneratorCommand, ProcessRunner};
