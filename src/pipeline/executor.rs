use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use super::plan::DeploymentPlan;
use super::report::PipelineReport;
use super::stage::{Stage, StageId};
use crate::config::Configuration;
use crate::display::ProgressDisplay;
use crate::error::{DeployError, ErrorCode, Result};
use crate::readiness::{Predicate, ReadinessWaiter};

/// Non-fatal results of a stage action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutcome {
    /// Absorbed idempotency conflicts and similar
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

impl StageOutcome {
    /// Show a warning now and keep it for the report
    pub fn warn(&mut self, display: &dyn ProgressDisplay, message: impl Into<String>) {
        let message = message.into();
        display.warning(&message);
        self.warnings.push(message);
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.notes.push(message.into());
    }
}

/// State shared by the stages of one run
#[derive(Debug, Default)]
pub struct RunContext {
    config: Option<Configuration>,
    completed: Vec<StageId>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The validated configuration. Only the validate stage may set it.
    pub fn config(&self) -> Result<&Configuration> {
        self.config.as_ref().ok_or_else(|| {
            DeployError::pipeline(
                ErrorCode::PIPELINE_MISSING_CONFIGURATION,
                "configuration has not been validated in this run",
                None,
            )
        })
    }

    pub fn set_config(&mut self, config: Configuration) {
        self.config = Some(config);
    }

    pub fn has_completed(&self, stage: StageId) -> bool {
        self.completed.contains(&stage)
    }

    fn mask(&self, text: &str) -> String {
        match &self.config {
            Some(config) => config.mask(text),
            None => text.to_string(),
        }
    }
}

/// The work behind each stage
#[async_trait]
pub trait StageActions: Send + Sync {
    async fn execute(&self, stage: &Stage, ctx: &mut RunContext) -> Result<StageOutcome>;
}

/// Runs a plan strictly in order, stopping at the first fatal error.
///
/// Side effects of completed stages are left in place on failure.
pub struct PipelineExecutor {
    actions: Arc<dyn StageActions>,
    waiter: ReadinessWaiter,
    display: Arc<dyn ProgressDisplay>,
}

impl PipelineExecutor {
    pub fn new(
        actions: Arc<dyn StageActions>,
        waiter: ReadinessWaiter,
        display: Arc<dyn ProgressDisplay>,
    ) -> Self {
        Self {
            actions,
            waiter,
            display,
        }
    }

    pub async fn run(&self, plan: &DeploymentPlan, report: &mut PipelineReport) -> Result<()> {
        let mut ctx = RunContext::new();
        let total = plan.stages.len();

        for (index, stage) in plan.stages.iter().enumerate() {
            self.display.info(&format!(
                "[{}/{}] {}",
                index + 1,
                total,
                stage.id.description()
            ));

            let started_at = Utc::now();
            let clock = Instant::now();

            match self.run_stage(stage, &mut ctx).await {
                Ok(outcome) => {
                    tracing::debug!("Stage {} completed in {:?}", stage.id, clock.elapsed());
                    report.record_success(
                        stage.id,
                        started_at,
                        clock.elapsed(),
                        outcome.warnings,
                        outcome.notes,
                    );
                    ctx.completed.push(stage.id);
                }
                Err(err) => {
                    let err = err.masked(|text| ctx.mask(text));
                    tracing::debug!("Stage {} failed: {}", stage.id, err.developer_message());
                    report.record_failure(stage.id, started_at, clock.elapsed(), err.to_string());
                    for remaining in &plan.stages[index + 1..] {
                        report.record_not_run(remaining.id);
                    }
                    report.finish(Some(&err));
                    return Err(err);
                }
            }
        }

        report.finish(None);
        self.display
            .success(&format!("'{}' finished: {} stage(s) completed", plan.command, total));
        Ok(())
    }

    async fn run_stage(&self, stage: &Stage, ctx: &mut RunContext) -> Result<StageOutcome> {
        let missing: Vec<&str> = stage
            .dependencies
            .iter()
            .filter(|dep| !ctx.has_completed(**dep))
            .map(StageId::name)
            .collect();
        if !missing.is_empty() {
            return Err(DeployError::pipeline(
                ErrorCode::PIPELINE_DEPENDENCY_NOT_MET,
                format!("requires {} to complete first", missing.join(", ")),
                Some(stage.id.to_string()),
            ));
        }

        let mut outcome = self.actions.execute(stage, ctx).await?;

        for condition in &stage.readiness {
            self.display.info(&format!(
                "Waiting for {} in {}",
                condition.workload(),
                condition.namespace
            ));
            let detail = self.waiter.require(condition).await?;
            match condition.predicate {
                Predicate::ExternalIp => {
                    self.display.success(&format!(
                        "{} reachable at http://{}",
                        condition.workload(),
                        detail
                    ));
                    outcome.note(format!("{} external address {}", condition.workload(), detail));
                }
                Predicate::Available => {
                    self.display
                        .success(&format!("{} ready ({})", condition.workload(), detail));
                }
            }
        }

        Ok(outcome)
    }
}
