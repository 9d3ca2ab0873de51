//! Pipeline layout settings
//!
//! Everything about *what* gets deployed (images, manifest locations,
//! namespaces, readiness conditions) lives here rather than in the stage
//! code. Every field has a built-in default matching the Bank of Anthos +
//! consent agent layout; a TOML file passed with `--settings` overrides any
//! subset of them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DeployError, ErrorCode, Result};
use crate::readiness::{Predicate, ReadinessCondition, ResourceKind, MAX_TIMEOUT};
use humantime_serde::re::humantime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    /// Tools that must resolve on PATH, checked in this order
    pub required_tools: Vec<String>,
    /// Provider APIs enabled for the project
    pub apis: Vec<String>,
    pub cluster: ClusterSettings,
    pub images: ImageSettings,
    pub base_app: BaseAppSettings,
    pub agents: AgentSettings,
    pub readiness: ReadinessSettings,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            required_tools: ["gcloud", "kubectl", "docker"]
                .into_iter()
                .map(String::from)
                .collect(),
            apis: [
                "container.googleapis.com",
                "artifactregistry.googleapis.com",
                "compute.googleapis.com",
                "generativelanguage.googleapis.com",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            cluster: ClusterSettings::default(),
            images: ImageSettings::default(),
            base_app: BaseAppSettings::default(),
            agents: AgentSettings::default(),
            readiness: ReadinessSettings::default(),
        }
    }
}

impl DeploySettings {
    /// Load settings from a TOML file; absent fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::config_with_code(
                ErrorCode::CONFIG_SETTINGS_FILE,
                format!("Cannot read settings file {}", path.display()),
            )
            .with_source(e)
        })?;
        Self::from_toml(&content).map_err(|e| e.with_context(path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).map_err(|e| {
            DeployError::config_with_code(ErrorCode::CONFIG_SETTINGS_FILE, "Invalid settings")
                .with_source(e)
        })?;
        settings.check()?;
        Ok(settings)
    }

    /// Load from `path` when given, otherwise the built-in layout
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!("Loading deploy settings from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    fn check(&self) -> Result<()> {
        if self.readiness.poll_interval.is_zero() {
            return Err(DeployError::config_with_code(
                ErrorCode::CONFIG_SETTINGS_FILE,
                "readiness.poll_interval must be greater than zero",
            ));
        }
        for condition in self.base_app.workloads.iter().chain(&self.agents.workloads) {
            if condition.timeout > MAX_TIMEOUT {
                return Err(DeployError::config_with_code(
                    ErrorCode::CONFIG_SETTINGS_FILE,
                    format!(
                        "Timeout for {} exceeds {}",
                        condition.workload(),
                        humantime::format_duration(MAX_TIMEOUT)
                    ),
                ));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for image in &self.images.workloads {
            if !seen.insert(image.name.as_str()) {
                return Err(DeployError::config_with_code(
                    ErrorCode::CONFIG_SETTINGS_FILE,
                    format!("Image '{}' is declared twice", image.name),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    pub private_nodes: bool,
    pub release_channel: Option<String>,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            private_nodes: true,
            release_channel: Some("regular".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Build context shared by every image
    pub context: PathBuf,
    pub platform: Option<String>,
    /// Built and pushed in this order
    pub workloads: Vec<ImageSpec>,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            context: PathBuf::from("agents"),
            platform: Some("linux/amd64".to_string()),
            workloads: [
                "monitoring-agent",
                "validation-agent",
                "audit-agent",
                "streamlit-dashboard",
            ]
            .into_iter()
            .map(ImageSpec::named)
            .collect(),
        }
    }
}

impl ImageSettings {
    /// Dockerfile for `image`, `<context>/Dockerfile.<name>` unless overridden
    pub fn dockerfile_for(&self, image: &ImageSpec) -> PathBuf {
        image
            .dockerfile
            .clone()
            .unwrap_or_else(|| self.context.join(format!("Dockerfile.{}", image.name)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub name: String,
    #[serde(default)]
    pub dockerfile: Option<PathBuf>,
}

impl ImageSpec {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dockerfile: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseAppSettings {
    /// Applied before the manifest directory
    pub extras: Vec<PathBuf>,
    pub manifests: PathBuf,
    pub workloads: Vec<ReadinessCondition>,
}

impl Default for BaseAppSettings {
    fn default() -> Self {
        let deployments = [
            "frontend",
            "userservice",
            "contacts",
            "balancereader",
            "ledgerwriter",
            "transactionhistory",
        ]
        .into_iter()
        .map(|name| ReadinessCondition::available(ResourceKind::Deployment, name, "default"));
        let databases = ["accounts-db", "ledger-db"]
            .into_iter()
            .map(|name| ReadinessCondition::available(ResourceKind::StatefulSet, name, "default"));

        Self {
            extras: vec![PathBuf::from("bank-of-anthos/extras/jwt/jwt-secret.yaml")],
            manifests: PathBuf::from("bank-of-anthos/kubernetes-manifests"),
            workloads: databases.chain(deployments).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub namespace: String,
    /// Manifest template with `${VAR}` placeholders
    pub template: PathBuf,
    pub workloads: Vec<ReadinessCondition>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        let namespace = "agents-ns";
        let mut workloads: Vec<_> = [
            "monitoring-agent",
            "validation-agent",
            "audit-agent",
            "streamlit-dashboard",
        ]
        .into_iter()
        .map(|name| ReadinessCondition::available(ResourceKind::Deployment, name, namespace))
        .collect();
        workloads.push(ReadinessCondition {
            kind: ResourceKind::Service,
            name: "streamlit-dashboard".to_string(),
            namespace: namespace.to_string(),
            predicate: Predicate::ExternalIp,
            timeout: crate::readiness::DEFAULT_TIMEOUT,
        });

        Self {
            namespace: namespace.to_string(),
            template: PathBuf::from("k8s/agents-deployment.yaml"),
            workloads,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessSettings {
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Upper bound for a single status query
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(30),
        }
    }
}
