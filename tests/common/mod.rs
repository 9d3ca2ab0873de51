//! Common test utilities and helpers
#![allow(dead_code)]

use boa_deploy::config::{AgentSettings, BaseAppSettings, DeploySettings, MapEnvReader};
use boa_deploy::subprocess::MockProcessRunner;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub const AGENT_TEMPLATE: &str = "\
apiVersion: v1
kind: ConfigMap
metadata:
  name: agent-config
  namespace: agents-ns
data:
  PROJECT_ID: ${PROJECT_ID}
  MONITORING_INTERVAL: \"${MONITORING_INTERVAL}\"
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: audit-agent
  namespace: agents-ns
spec:
  template:
    spec:
      containers:
        - name: audit-agent
          image: ${IMAGE_REGISTRY}/audit-agent:${IMAGE_TAG}
";

/// A minimal environment that passes validation
pub fn valid_env() -> MapEnvReader {
    MapEnvReader::new()
        .with("PROJECT_ID", "demo-1")
        .with("GOOGLE_API_KEY", "AIza-real-key")
}

/// Temporary directory holding the manifests a deployment needs
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_template(AGENT_TEMPLATE)
    }

    pub fn with_template(template: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("manifests")).unwrap();
        fs::write(root.join("manifests/frontend.yaml"), "kind: Deployment\n").unwrap();
        fs::write(root.join("jwt-secret.yaml"), "kind: Secret\n").unwrap();
        fs::write(root.join("agents-deployment.yaml"), template).unwrap();
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn template_path(&self) -> PathBuf {
        self.path().join("agents-deployment.yaml")
    }

    /// Default layout with manifest paths redirected into this workspace
    pub fn settings(&self) -> DeploySettings {
        let mut settings = DeploySettings::default();
        settings.base_app = BaseAppSettings {
            extras: vec![self.path().join("jwt-secret.yaml")],
            manifests: self.path().join("manifests"),
            ..BaseAppSettings::default()
        };
        settings.agents = AgentSettings {
            template: self.template_path(),
            ..AgentSettings::default()
        };
        settings.readiness.poll_interval = Duration::from_secs(5);
        settings
    }
}

fn has(args: &[String], value: &str) -> bool {
    args.iter().any(|a| a == value)
}

pub fn ready_deployment_json() -> &'static str {
    r#"{"metadata":{"generation":1},"spec":{"replicas":1},"status":{"availableReplicas":1,"observedGeneration":1}}"#
}

pub fn pending_deployment_json() -> &'static str {
    r#"{"metadata":{"generation":1},"spec":{"replicas":1},"status":{"observedGeneration":1}}"#
}

/// Tools present, authenticated, nothing created yet
pub fn script_tools(mock: &mut MockProcessRunner) {
    mock.expect_command("which")
        .returns_stdout("/usr/local/bin/tool\n")
        .finish();
    mock.expect_command("gcloud")
        .with_args(|args| has(args, "auth") && has(args, "list"))
        .returns_stdout("ops@example.com\n")
        .finish();
}

/// Workloads report ready and the dashboard has an external address
pub fn script_ready_workloads(mock: &mut MockProcessRunner) {
    mock.expect_command("kubectl")
        .with_args(|args| args.first().map(String::as_str) == Some("get") && has(args, "statefulset"))
        .returns_stdout(r#"{"spec":{"replicas":1},"status":{"readyReplicas":1}}"#)
        .finish();
    mock.expect_command("kubectl")
        .with_args(|args| args.first().map(String::as_str) == Some("get") && has(args, "service"))
        .returns_stdout(r#"{"status":{"loadBalancer":{"ingress":[{"ip":"34.120.8.9"}]}}}"#)
        .finish();
    mock.expect_command("kubectl")
        .with_args(|args| args.first().map(String::as_str) == Some("get") && has(args, "deployment"))
        .returns_stdout(ready_deployment_json())
        .finish();
}

/// A first run against an empty project
pub fn script_fresh_project(mock: &mut MockProcessRunner) {
    script_tools(mock);
    mock.expect_command("gcloud")
        .with_args(|args| has(args, "describe"))
        .returns_exit_code(1)
        .returns_stderr("ERROR: (gcloud.container.clusters.describe) NOT_FOUND: cluster not found")
        .finish();
    mock.expect_command("gcloud").returns_success().finish();
    mock.expect_command("docker").returns_success().finish();
    script_ready_workloads(mock);
    mock.expect_command("kubectl").returns_success().finish();
}

/// A second run where every create reports a duplicate
pub fn script_existing_project(mock: &mut MockProcessRunner) {
    script_tools(mock);
    mock.expect_command("gcloud")
        .with_args(|args| has(args, "describe"))
        .returns_stdout("RUNNING\n")
        .finish();
    mock.expect_command("gcloud")
        .with_args(|args| has(args, "repositories") && has(args, "create"))
        .returns_exit_code(1)
        .returns_stderr("ERROR: ALREADY_EXISTS: the repository already exists")
        .finish();
    mock.expect_command("gcloud").returns_success().finish();
    mock.expect_command("docker").returns_success().finish();
    mock.expect_command("kubectl")
        .with_args(|args| has(args, "namespace"))
        .returns_exit_code(1)
        .returns_stderr("Error from server (AlreadyExists): namespaces \"agents-ns\" already exists")
        .finish();
    script_ready_workloads(mock);
    mock.expect_command("kubectl").returns_success().finish();
}

/// Positions of calls to `program` whose argv contains `needle`
pub fn call_index(mock: &MockProcessRunner, program: &str, needle: &str) -> Option<usize> {
    mock.get_call_history()
        .iter()
        .position(|cmd| cmd.program == program && cmd.args.iter().any(|a| a == needle))
}
