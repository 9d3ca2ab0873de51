use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::builder::ProcessCommandBuilder;
use super::error::ProcessError;
use super::runner::{ProcessOutput, ProcessRunner};

#[async_trait]
pub trait KubectlRunner: Send + Sync {
    /// `kubectl apply -f <path>`; returns kubectl's summary of applied objects
    async fn apply_path(&self, path: &Path) -> Result<String, ProcessError>;
    /// `kubectl apply -f -` with the document on stdin
    async fn apply_document(&self, document: String) -> Result<String, ProcessError>;
    /// Raw output so the caller can apply its idempotency policy
    async fn create_namespace(&self, namespace: &str) -> Result<ProcessOutput, ProcessError>;
    /// `kubectl get <kind> <name> -n <namespace> -o json`
    async fn get_json(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<String, ProcessError>;
}

pub struct KubectlRunnerImpl {
    runner: Arc<dyn ProcessRunner>,
}

impl KubectlRunnerImpl {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl KubectlRunner for KubectlRunnerImpl {
    async fn apply_path(&self, path: &Path) -> Result<String, ProcessError> {
        let path = path.to_string_lossy();
        let command = ProcessCommandBuilder::new("kubectl")
            .args(["apply", "-f", &*path])
            .build();
        let output = self.runner.run(command.clone()).await?;
        Ok(output.into_success(&command)?.stdout)
    }

    async fn apply_document(&self, document: String) -> Result<String, ProcessError> {
        let command = ProcessCommandBuilder::new("kubectl")
            .args(["apply", "-f", "-"])
            .stdin(document)
            .build();
        let output = self.runner.run(command.clone()).await?;
        Ok(output.into_success(&command)?.stdout)
    }

    async fn create_namespace(&self, namespace: &str) -> Result<ProcessOutput, ProcessError> {
        let command = ProcessCommandBuilder::new("kubectl")
            .args(["create", "namespace", namespace])
            .build();
        self.runner.run(command).await
    }

    async fn get_json(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<String, ProcessError> {
        let command = ProcessCommandBuilder::new("kubectl")
            .args(["get", kind, name, "-n", namespace, "-o", "json"])
            .timeout(timeout)
            .build();
        let output = self.runner.run(command.clone()).await?;
        Ok(output.into_success(&command)?.stdout)
    }
}
