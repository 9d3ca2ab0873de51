//! Stage actions backed by gcloud, kubectl and docker

pub mod cluster;
pub mod images;
pub mod manifests;
pub mod prerequisites;
pub mod project;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{DeploySettings, EnvReader, EnvironmentValidator};
use crate::display::ProgressDisplay;
use crate::error::{DeployError, Result};
use crate::pipeline::{PipelineExecutor, RunContext, Stage, StageActions, StageId, StageOutcome};
use crate::readiness::{KubectlProbe, ReadinessWaiter};
use crate::subprocess::{DockerRunner, GcloudRunner, KubectlRunner, ProcessError, SubprocessManager};

pub(crate) fn provisioning_error(
    code: u16,
    message: &str,
    resource: &str,
    e: ProcessError,
) -> DeployError {
    DeployError::provisioning(code, message, resource)
        .with_context(&e)
        .with_source(e)
}

/// Production `StageActions`
pub struct DeploymentStages {
    manager: SubprocessManager,
    gcloud: Arc<dyn GcloudRunner>,
    kubectl: Arc<dyn KubectlRunner>,
    docker: Arc<dyn DockerRunner>,
    settings: DeploySettings,
    env: Arc<dyn EnvReader>,
    display: Arc<dyn ProgressDisplay>,
}

impl DeploymentStages {
    pub fn new(
        manager: SubprocessManager,
        settings: DeploySettings,
        env: Arc<dyn EnvReader>,
        display: Arc<dyn ProgressDisplay>,
    ) -> Self {
        Self {
            gcloud: Arc::new(manager.gcloud()),
            kubectl: Arc::new(manager.kubectl()),
            docker: Arc::new(manager.docker()),
            manager,
            settings,
            env,
            display,
        }
    }
}

#[async_trait]
impl StageActions for DeploymentStages {
    async fn execute(&self, stage: &Stage, ctx: &mut RunContext) -> Result<StageOutcome> {
        let display = self.display.as_ref();

        match stage.id {
            StageId::Validate => {
                let config = EnvironmentValidator::new().validate(self.env.as_ref())?;
                display.success(&format!(
                    "Configuration valid: project {}, region {}, cluster {}",
                    config.project_id(),
                    config.region(),
                    config.cluster_name()
                ));
                for (key, value) in config.display_entries() {
                    tracing::debug!("config {}={}", key, value);
                }
                ctx.set_config(config);
                Ok(StageOutcome::default())
            }
            StageId::Prerequisites => {
                prerequisites::check(
                    &self.manager,
                    self.gcloud.as_ref(),
                    &self.settings.required_tools,
                    display,
                )
                .await
            }
            StageId::Project => {
                project::provision(
                    self.gcloud.as_ref(),
                    ctx.config()?,
                    &self.settings.apis,
                    stage.idempotency,
                    display,
                )
                .await
            }
            StageId::Cluster => {
                cluster::provision(
                    self.gcloud.as_ref(),
                    ctx.config()?,
                    &self.settings.cluster,
                    stage.idempotency,
                    display,
                )
                .await
            }
            StageId::Images => {
                images::build_and_push(
                    self.gcloud.as_ref(),
                    self.docker.as_ref(),
                    ctx.config()?,
                    &self.settings.images,
                    display,
                )
                .await
            }
            StageId::BaseApp => {
                manifests::deploy_base(self.kubectl.as_ref(), &self.settings.base_app, display).await
            }
            StageId::AgentSwarm => {
                manifests::deploy_agents(
                    self.kubectl.as_ref(),
                    ctx.config()?,
                    &self.settings.agents,
                    stage.idempotency,
                    display,
                )
                .await
            }
        }
    }
}

/// Wire the production stages and a kubectl-backed readiness waiter
pub fn pipeline_executor(
    manager: SubprocessManager,
    settings: DeploySettings,
    env: Arc<dyn EnvReader>,
    display: Arc<dyn ProgressDisplay>,
) -> PipelineExecutor {
    let probe = KubectlProbe::new(Arc::new(manager.kubectl()), settings.readiness.probe_timeout);
    let waiter = ReadinessWaiter::new(Arc::new(probe), settings.readiness.poll_interval);
    let actions = DeploymentStages::new(manager, settings, env, Arc::clone(&display));
    PipelineExecutor::new(Arc::new(actions), waiter, display)
}
