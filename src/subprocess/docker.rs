use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::builder::ProcessCommandBuilder;
use super::error::ProcessError;
use super::runner::ProcessRunner;

#[async_trait]
pub trait DockerRunner: Send + Sync {
    async fn build(
        &self,
        image: &str,
        dockerfile: &Path,
        context: &Path,
        platform: Option<&str>,
    ) -> Result<(), ProcessError>;
    async fn push(&self, image: &str) -> Result<(), ProcessError>;
}

pub struct DockerRunnerImpl {
    runner: Arc<dyn ProcessRunner>,
}

impl DockerRunnerImpl {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl DockerRunner for DockerRunnerImpl {
    async fn build(
        &self,
        image: &str,
        dockerfile: &Path,
        context: &Path,
        platform: Option<&str>,
    ) -> Result<(), ProcessError> {
        let dockerfile = dockerfile.to_string_lossy();
        let context = context.to_string_lossy();

        let mut builder = ProcessCommandBuilder::new("docker").args(["build", "-t", image]);
        if let Some(platform) = platform {
            builder = builder.flag("platform", platform);
        }
        let command = builder
            .args(["-f", &*dockerfile, &*context])
            .build();

        let output = self.runner.run(command.clone()).await?;
        output.into_success(&command).map(|_| ())
    }

    async fn push(&self, image: &str) -> Result<(), ProcessError> {
        let command = ProcessCommandBuilder::new("docker")
            .args(["push", image])
            .build();
        let output = self.runner.run(command.clone()).await?;
        output.into_success(&command).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::MockProcessRunner;

    #[tokio::test]
    async fn test_build_argv() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("docker").finish();

        let docker = DockerRunnerImpl::new(Arc::new(mock.clone()));
        docker
            .build(
                "us-central1-docker.pkg.dev/demo-1/consent-agents/audit-agent:latest",
                Path::new("agents/Dockerfile.audit-agent"),
                Path::new("agents"),
                Some("linux/amd64"),
            )
            .await
            .unwrap();

        assert_eq!(
            mock.get_call_history()[0].args,
            vec![
                "build",
                "-t",
                "us-central1-docker.pkg.dev/demo-1/consent-agents/audit-agent:latest",
                "--platform=linux/amd64",
                "-f",
                "agents/Dockerfile.audit-agent",
                "agents",
            ]
        );
    }

    #[tokio::test]
    async fn test_push_failure() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("docker")
            .returns_exit_code(1)
            .returns_stderr("denied: Permission \"artifactregistry.repositories.uploadArtifacts\" denied")
            .finish();

        let docker = DockerRunnerImpl::new(Arc::new(mock));
        let err = docker.push("img:latest").await.unwrap_err();
        assert!(matches!(err, ProcessError::Failed { code: 1, .. }));
    }
}
