pub mod builder;
pub mod docker;
pub mod error;
pub mod gcloud;
pub mod kubectl;
pub mod mock;
pub mod runner;


pub use builder::ProcessCommandBuilder;
pub use docker::{DockerRunner, DockerRunnerImpl};
pub use error::ProcessError;
pub use gcloud::{ClusterSpec, GcloudRunner, GcloudRunnerImpl};
pub use kubectl::{KubectlRunner, KubectlRunnerImpl};
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner, TokioProcessRunner};

use std::sync::Arc;

#[derive(Clone)]
pub struct SubprocessManager {
    runner: Arc<dyn ProcessRunner>,
}

impl SubprocessManager {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    pub fn production() -> Self {
        Self::new(Arc::new(runner::TokioProcessRunner))
    }

    /// Manager backed by a scripted runner; the returned mock shares state
    /// with the one inside the manager.
    pub fn mock() -> (Self, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
        (Self::new(runner), mock)
    }

    pub fn gcloud(&self) -> GcloudRunnerImpl {
        GcloudRunnerImpl::new(Arc::clone(&self.runner))
    }

    pub fn kubectl(&self) -> KubectlRunnerImpl {
        KubectlRunnerImpl::new(Arc::clone(&self.runner))
    }

    pub fn docker(&self) -> DockerRunnerImpl {
        DockerRunnerImpl::new(Arc::clone(&self.runner))
    }

    /// Whether `tool` resolves on PATH.
    ///
    /// Uses `which`, falling back to spawning `<tool> --version` on hosts
    /// without it. Any exit status counts as resolved there; `kubectl`
    /// rejects `--version` but still starts.
    pub async fn which(&self, tool: &str) -> Result<bool, ProcessError> {
        let lookup = self
            .runner
            .run(ProcessCommandBuilder::new("which").arg(tool).build())
            .await;

        match lookup {
            Ok(output) => Ok(output.status.success() && !output.stdout.trim().is_empty()),
            Err(ProcessError::CommandNotFound(_)) => {
                let version = self
                    .runner
                    .run(ProcessCommandBuilder::new(tool).arg("--version").build())
                    .await;
                match version {
                    Ok(_) => Ok(true),
                    Err(ProcessError::CommandNotFound(_)) => Ok(false),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}
