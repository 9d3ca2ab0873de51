pub mod env_reader;
pub mod settings;
pub mod validator;

pub use env_reader::{EnvReader, LayeredEnvReader, MapEnvReader, RealEnvReader};
pub use settings::{
    AgentSettings, BaseAppSettings, ClusterSettings, DeploySettings, ImageSettings, ImageSpec,
    ReadinessSettings,
};
pub use validator::EnvironmentValidator;

use std::collections::BTreeMap;
use std::fmt;

pub const PROJECT_ID: &str = "PROJECT_ID";
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const GCP_LOCATION: &str = "GCP_LOCATION";
pub const REGION: &str = "REGION";
pub const CLUSTER_NAME: &str = "CLUSTER_NAME";
pub const MONITORING_INTERVAL: &str = "MONITORING_INTERVAL";
pub const AUDIT_LOG_PATH: &str = "AUDIT_LOG_PATH";
pub const REPORT_INTERVAL_MINUTES: &str = "REPORT_INTERVAL_MINUTES";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const ARTIFACT_REPOSITORY: &str = "ARTIFACT_REPOSITORY";
pub const IMAGE_TAG: &str = "IMAGE_TAG";
pub const IMAGE_REGISTRY: &str = "IMAGE_REGISTRY";

const MASK: &str = "***MASKED***";

/// How a value is checked beyond presence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    PositiveInteger,
}

/// Declaration of one configuration key
#[derive(Debug, Clone, Copy)]
pub struct ConfigKey {
    pub name: &'static str,
    /// `None` marks a required key
    pub default: Option<&'static str>,
    /// Sample values from `.env.example` that must never reach a deployment
    pub placeholders: &'static [&'static str],
    pub secret: bool,
    pub kind: ValueKind,
}

impl ConfigKey {
    const fn required(name: &'static str, placeholders: &'static [&'static str]) -> Self {
        Self {
            name,
            default: None,
            placeholders,
            secret: false,
            kind: ValueKind::Text,
        }
    }

    const fn optional(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default: Some(default),
            placeholders: &[],
            secret: false,
            kind: ValueKind::Text,
        }
    }

    const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    const fn numeric(mut self) -> Self {
        self.kind = ValueKind::PositiveInteger;
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn is_placeholder(&self, value: &str) -> bool {
        let value = value.trim();
        self.placeholders
            .iter()
            .any(|p| p.eq_ignore_ascii_case(value))
    }
}

/// Required keys, in the order they are checked
pub const REQUIRED_KEYS: &[ConfigKey] = &[
    ConfigKey::required(PROJECT_ID, &["your-gcp-project-id", "your-project-id"]),
    ConfigKey::required(GOOGLE_API_KEY, &["your-google-ai-api-key", "your-api-key"]).secret(),
];

/// Optional keys with their defaults. The region is resolved separately
/// because it has two accepted names.
pub const OPTIONAL_KEYS: &[ConfigKey] = &[
    ConfigKey::optional(CLUSTER_NAME, "boa-consent-cluster"),
    ConfigKey::optional(MONITORING_INTERVAL, "30").numeric(),
    ConfigKey::optional(AUDIT_LOG_PATH, "/tmp/audit_log.json"),
    ConfigKey::optional(REPORT_INTERVAL_MINUTES, "60").numeric(),
    ConfigKey::optional(LOG_LEVEL, "INFO"),
    ConfigKey::optional(ARTIFACT_REPOSITORY, "consent-agents"),
    ConfigKey::optional(IMAGE_TAG, "latest"),
];

pub const DEFAULT_REGION: &str = "us-central1";

/// Validated, immutable deployment configuration.
///
/// Only `EnvironmentValidator` builds one, so holding a `Configuration`
/// means every required key is present and not a placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    values: BTreeMap<String, String>,
    secret_keys: Vec<String>,
}

// Secrets stay masked even in debug output
impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.display_entries()).finish()
    }
}

impl Configuration {
    pub(crate) fn new(values: BTreeMap<String, String>, secret_keys: Vec<String>) -> Self {
        Self {
            values,
            secret_keys,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// All resolved entries, including derived ones
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    pub fn project_id(&self) -> &str {
        self.value(PROJECT_ID)
    }

    pub fn region(&self) -> &str {
        self.value(GCP_LOCATION)
    }

    pub fn cluster_name(&self) -> &str {
        self.value(CLUSTER_NAME)
    }

    pub fn repository(&self) -> &str {
        self.value(ARTIFACT_REPOSITORY)
    }

    pub fn image_tag(&self) -> &str {
        self.value(IMAGE_TAG)
    }

    /// `<region>-docker.pkg.dev`
    pub fn registry_host(&self) -> String {
        format!("{}-docker.pkg.dev", self.region())
    }

    pub fn image_registry(&self) -> &str {
        self.value(IMAGE_REGISTRY)
    }

    /// Fully qualified, tagged reference for a workload image
    pub fn image_ref(&self, workload: &str) -> String {
        format!("{}/{}:{}", self.image_registry(), workload, self.image_tag())
    }

    pub fn is_secret(&self, key: &str) -> bool {
        self.secret_keys.iter().any(|k| k == key)
    }

    /// Replace every secret value occurring in `text`
    pub fn mask(&self, text: &str) -> String {
        let mut masked = text.to_string();
        for key in &self.secret_keys {
            if let Some(value) = self.values.get(key) {
                if !value.trim().is_empty() {
                    masked = masked.replace(value.as_str(), MASK);
                }
            }
        }
        masked
    }

    /// Entries safe to print, secrets replaced by the mask
    pub fn display_entries(&self) -> Vec<(&str, &str)> {
        self.values
            .iter()
            .map(|(k, v)| {
                let shown = if self.is_secret(k) { MASK } else { v.as_str() };
                (k.as_str(), shown)
            })
            .collect()
    }
}
