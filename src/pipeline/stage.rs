use serde::{Deserialize, Serialize};
use std::fmt;

use super::idempotency::IdempotencyPolicy;
use crate::config::DeploySettings;
use crate::readiness::ReadinessCondition;

/// The statically known pipeline stages, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    Validate,
    Prerequisites,
    Project,
    Cluster,
    Images,
    BaseApp,
    AgentSwarm,
}

impl StageId {
    pub const ALL: [StageId; 7] = [
        StageId::Validate,
        StageId::Prerequisites,
        StageId::Project,
        StageId::Cluster,
        StageId::Images,
        StageId::BaseApp,
        StageId::AgentSwarm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageId::Validate => "validate",
            StageId::Prerequisites => "prerequisites",
            StageId::Project => "project",
            StageId::Cluster => "cluster",
            StageId::Images => "images",
            StageId::BaseApp => "base-app",
            StageId::AgentSwarm => "agent-swarm",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StageId::Validate => "Validate environment configuration",
            StageId::Prerequisites => "Check required tools and authentication",
            StageId::Project => "Prepare project APIs and artifact repository",
            StageId::Cluster => "Provision Autopilot cluster",
            StageId::Images => "Build and push agent images",
            StageId::BaseApp => "Deploy Bank of Anthos",
            StageId::AgentSwarm => "Deploy consent agent swarm",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit of work in the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub id: StageId,
    /// Must have completed in the same run before this stage starts
    pub dependencies: Vec<StageId>,
    pub idempotency: IdempotencyPolicy,
    /// Waited for, in order, after the action succeeds
    pub readiness: Vec<ReadinessCondition>,
}

impl Stage {
    fn new(id: StageId, dependencies: &[StageId], idempotency: IdempotencyPolicy) -> Self {
        Self {
            id,
            dependencies: dependencies.to_vec(),
            idempotency,
            readiness: Vec::new(),
        }
    }

    fn waiting_for(mut self, readiness: Vec<ReadinessCondition>) -> Self {
        self.readiness = readiness;
        self
    }
}

/// The full pipeline, in execution order
pub fn catalog(settings: &DeploySettings) -> Vec<Stage> {
    use IdempotencyPolicy::{NotApplicable, TreatDuplicateAsSuccess};
    use StageId::*;

    // Base app uses declarative `kubectl apply`, which never reports a duplicate
    vec![
        Stage::new(Validate, &[], NotApplicable),
        Stage::new(Prerequisites, &[], NotApplicable),
        Stage::new(Project, &[Validate, Prerequisites], TreatDuplicateAsSuccess),
        Stage::new(Cluster, &[Project], TreatDuplicateAsSuccess),
        Stage::new(Images, &[Project], NotApplicable),
        Stage::new(BaseApp, &[Validate, Prerequisites], NotApplicable)
            .waiting_for(settings.base_app.workloads.clone()),
        Stage::new(AgentSwarm, &[Validate, Prerequisites], TreatDuplicateAsSuccess)
            .waiting_for(settings.agents.workloads.clone()),
    ]
}
