//! Staged deployment pipeline
//!
//! A run is a `DeploymentPlan` (an ordered subset of the stage catalog,
//! chosen by the command token) executed by `PipelineExecutor`. Stages run
//! one at a time; each checks that its dependencies completed earlier in the
//! same run, performs its action, then waits for its readiness conditions.

pub mod executor;
pub mod idempotency;
pub mod plan;
pub mod report;
pub mod stage;

pub use executor::{PipelineExecutor, RunContext, StageActions, StageOutcome};
pub use idempotency::{is_already_exists, CreateOutcome, IdempotencyPolicy};
pub use plan::{DeployCommand, DeploymentPlan};
pub use report::{PipelineReport, StageRecord, StageStatus};
pub use stage::{catalog, Stage, StageId};
