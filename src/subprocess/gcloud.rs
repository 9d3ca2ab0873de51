use async_trait::async_trait;
use std::sync::Arc;

use super::builder::ProcessCommandBuilder;
use super::error::ProcessError;
use super::runner::{ProcessOutput, ProcessRunner};

/// Parameters for an Autopilot cluster
#[derive(Debug, Clone)]
pub struct ClusterSpec {
    pub project: String,
    pub location: String,
    pub name: String,
    pub private_nodes: bool,
    pub release_channel: Option<String>,
}

#[async_trait]
pub trait GcloudRunner: Send + Sync {
    /// Account of the active credential, `None` when nobody is logged in
    async fn active_account(&self) -> Result<Option<String>, ProcessError>;
    async fn set_project(&self, project: &str) -> Result<(), ProcessError>;
    async fn enable_services(&self, project: &str, services: &[String])
        -> Result<(), ProcessError>;
    /// Raw output so the caller can apply its idempotency policy
    async fn create_docker_repository(
        &self,
        project: &str,
        location: &str,
        repository: &str,
    ) -> Result<ProcessOutput, ProcessError>;
    /// Cluster status string (`RUNNING`, ...), `None` when it does not exist
    async fn cluster_status(
        &self,
        project: &str,
        location: &str,
        name: &str,
    ) -> Result<Option<String>, ProcessError>;
    async fn create_autopilot_cluster(&self, spec: &ClusterSpec)
        -> Result<ProcessOutput, ProcessError>;
    async fn get_credentials(
        &self,
        project: &str,
        location: &str,
        name: &str,
    ) -> Result<(), ProcessError>;
    async fn configure_docker(&self, registry_host: &str) -> Result<(), ProcessError>;
}

pub struct GcloudRunnerImpl {
    runner: Arc<dyn ProcessRunner>,
}

impl GcloudRunnerImpl {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    async fn run_checked(
        &self,
        builder: ProcessCommandBuilder,
    ) -> Result<ProcessOutput, ProcessError> {
        let command = builder.build();
        let output = self.runner.run(command.clone()).await?;
        output.into_success(&command)
    }
}

/// Every gcloud call runs with interactive prompts disabled
fn gcloud() -> ProcessCommandBuilder {
    ProcessCommandBuilder::new("gcloud").env("CLOUDSDK_CORE_DISABLE_PROMPTS", "1")
}

/// gcloud reports missing resources as NOT_FOUND (API) or "not found" (CLI)
fn is_not_found(stderr: &str) -> bool {
    stderr.contains("NOT_FOUND") || stderr.to_lowercase().contains("not found")
}

#[async_trait]
impl GcloudRunner for GcloudRunnerImpl {
    async fn active_account(&self) -> Result<Option<String>, ProcessError> {
        let output = self
            .run_checked(
                gcloud()
                    .args(["auth", "list"])
                    .flag("filter", "status:ACTIVE")
                    .flag("format", "value(account)"),
            )
            .await?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string))
    }

    async fn set_project(&self, project: &str) -> Result<(), ProcessError> {
        self.run_checked(
            gcloud().args(["config", "set", "project", project]),
        )
        .await
        .map(|_| ())
    }

    async fn enable_services(
        &self,
        project: &str,
        services: &[String],
    ) -> Result<(), ProcessError> {
        self.run_checked(
            gcloud()
                .args(["services", "enable"])
                .args(services)
                .flag("project", project),
        )
        .await
        .map(|_| ())
    }

    async fn create_docker_repository(
        &self,
        project: &str,
        location: &str,
        repository: &str,
    ) -> Result<ProcessOutput, ProcessError> {
        let command = gcloud()
            .args(["artifacts", "repositories", "create", repository])
            .flag("repository-format", "docker")
            .flag("location", location)
            .flag("description", "Container images for the consent agent swarm")
            .flag("project", project)
            .build();
        self.runner.run(command).await
    }

    async fn cluster_status(
        &self,
        project: &str,
        location: &str,
        name: &str,
    ) -> Result<Option<String>, ProcessError> {
        let command = gcloud()
            .args(["container", "clusters", "describe", name])
            .flag("region", location)
            .flag("project", project)
            .flag("format", "value(status)")
            .build();
        let output = self.runner.run(command.clone()).await?;

        if output.status.success() {
            return Ok(Some(output.stdout.trim().to_string()));
        }
        if is_not_found(&output.stderr) {
            return Ok(None);
        }
        output.into_success(&command).map(|_| None)
    }

    async fn create_autopilot_cluster(
        &self,
        spec: &ClusterSpec,
    ) -> Result<ProcessOutput, ProcessError> {
        let command = gcloud()
            .args(["container", "clusters", "create-auto", spec.name.as_str()])
            .flag("region", &spec.location)
            .flag("project", &spec.project)
            .switch("enable-private-nodes", spec.private_nodes)
            .flag_opt("release-channel", spec.release_channel.as_deref())
            .switch("quiet", true)
            .build();
        self.runner.run(command).await
    }

    async fn get_credentials(
        &self,
        project: &str,
        location: &str,
        name: &str,
    ) -> Result<(), ProcessError> {
        self.run_checked(
            gcloud()
                .args(["container", "clusters", "get-credentials", name])
                .flag("region", location)
                .flag("project", project),
        )
        .await
        .map(|_| ())
    }

    async fn configure_docker(&self, registry_host: &str) -> Result<(), ProcessError> {
        self.run_checked(
            gcloud()
                .args(["auth", "configure-docker", registry_host, "--quiet"]),
        )
        .await
        .map(|_| ())
    }
}
