use std::collections::BTreeMap;

use super::{
    Configuration, EnvReader, ValueKind, ARTIFACT_REPOSITORY, DEFAULT_REGION, GCP_LOCATION,
    IMAGE_REGISTRY, OPTIONAL_KEYS, PROJECT_ID, REGION, REQUIRED_KEYS,
};
use crate::error::{DeployError, Result};

/// Turns a raw environment into a validated `Configuration`.
///
/// Pure with respect to the outside world: it only reads through the given
/// `EnvReader`, so a failure here happens before any external command.
#[derive(Debug, Default, Clone)]
pub struct EnvironmentValidator;

impl EnvironmentValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, env: &dyn EnvReader) -> Result<Configuration> {
        let mut values = BTreeMap::new();
        let mut secret_keys = Vec::new();

        for key in REQUIRED_KEYS {
            let value = read_trimmed(env, key.name).ok_or_else(|| {
                tracing::debug!("Required key {} is missing", key.name);
                DeployError::config_missing(key.name)
            })?;
            if key.is_placeholder(&value) {
                return Err(DeployError::config_placeholder(key.name));
            }
            if key.secret {
                secret_keys.push(key.name.to_string());
            }
            values.insert(key.name.to_string(), value);
        }

        for key in OPTIONAL_KEYS {
            let value = read_trimmed(env, key.name)
                .unwrap_or_else(|| key.default.unwrap_or_default().to_string());
            if key.kind == ValueKind::PositiveInteger {
                check_positive_integer(key.name, &value)?;
            }
            values.insert(key.name.to_string(), value);
        }

        let region = read_trimmed(env, GCP_LOCATION)
            .or_else(|| read_trimmed(env, REGION))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        values.insert(GCP_LOCATION.to_string(), region.clone());
        values.insert(REGION.to_string(), region.clone());

        let registry = format!(
            "{}-docker.pkg.dev/{}/{}",
            region, values[PROJECT_ID], values[ARTIFACT_REPOSITORY]
        );
        values.insert(IMAGE_REGISTRY.to_string(), registry);

        tracing::debug!("Configuration validated with {} entries", values.len());
        Ok(Configuration::new(values, secret_keys))
    }
}

/// Blank values count as absent
fn read_trimmed(env: &dyn EnvReader, key: &str) -> Option<String> {
    env.var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_positive_integer(key: &str, value: &str) -> Result<()> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(()),
        _ => Err(DeployError::config_invalid(
            key,
            format!("expected a positive integer, got '{}'", value),
        )
        .with_remediation(format!("Set {} to a whole number greater than zero", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        MapEnvReader, CLUSTER_NAME, GOOGLE_API_KEY, IMAGE_TAG, MONITORING_INTERVAL,
        REPORT_INTERVAL_MINUTES,
    };
    use crate::error::ErrorCode;

    fn valid_env() -> MapEnvReader {
        MapEnvReader::new()
            .with(PROJECT_ID, "demo-1")
            .with(GOOGLE_API_KEY, "AIza-real-key")
    }

    #[test]
    fn test_defaults_applied() {
        let config = EnvironmentValidator::new().validate(&valid_env()).unwrap();

        assert_eq!(config.project_id(), "demo-1");
        assert_eq!(config.region(), "us-central1");
        assert_eq!(config.get(REGION), Some("us-central1"));
        assert_eq!(config.cluster_name(), "boa-consent-cluster");
        assert_eq!(config.get(MONITORING_INTERVAL), Some("30"));
        assert_eq!(config.get("AUDIT_LOG_PATH"), Some("/tmp/audit_log.json"));
        assert_eq!(config.get(REPORT_INTERVAL_MINUTES), Some("60"));
        assert_eq!(config.get("LOG_LEVEL"), Some("INFO"));
        assert_eq!(config.image_tag(), "latest");
        assert_eq!(
            config.image_registry(),
            "us-central1-docker.pkg.dev/demo-1/consent-agents"
        );
    }

    #[test]
    fn test_missing_project_id_reported_first() {
        let err = EnvironmentValidator::new()
            .validate(&MapEnvReader::new())
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::CONFIG_MISSING_REQUIRED);
        assert_eq!(err.config_key(), Some(PROJECT_ID));
        assert!(err.remediation().unwrap().contains("export PROJECT_ID"));
    }

    #[test]
    fn test_missing_api_key() {
        let env = MapEnvReader::new().with(PROJECT_ID, "demo-1");
        let err = EnvironmentValidator::new().validate(&env).unwrap_err();
        assert_eq!(err.config_key(), Some(GOOGLE_API_KEY));
    }

    #[test]
    fn test_placeholder_project_rejected() {
        let env = valid_env().with(PROJECT_ID, "your-gcp-project-id");
        let err = EnvironmentValidator::new().validate(&env).unwrap_err();

        assert_eq!(err.code(), ErrorCode::CONFIG_PLACEHOLDER_VALUE);
        assert_eq!(err.config_key(), Some(PROJECT_ID));
        assert!(err.to_string().contains("PROJECT_ID"));
        assert!(!err.to_string().contains("your-gcp-project-id"));
    }

    #[test]
    fn test_placeholder_api_key_rejected() {
        let env = valid_env().with(GOOGLE_API_KEY, "your-google-ai-api-key");
        let err = EnvironmentValidator::new().validate(&env).unwrap_err();
        assert_eq!(err.config_key(), Some(GOOGLE_API_KEY));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let env = valid_env().with(PROJECT_ID, "   ");
        let err = EnvironmentValidator::new().validate(&env).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_MISSING_REQUIRED);
    }

    #[test]
    fn test_region_alias() {
        let env = valid_env().with(REGION, "europe-west1");
        let config = EnvironmentValidator::new().validate(&env).unwrap();
        assert_eq!(config.region(), "europe-west1");
        assert_eq!(config.get(GCP_LOCATION), Some("europe-west1"));

        let env = valid_env()
            .with(REGION, "europe-west1")
            .with(GCP_LOCATION, "asia-east1");
        let config = EnvironmentValidator::new().validate(&env).unwrap();
        assert_eq!(config.region(), "asia-east1");
        assert_eq!(config.get(REGION), Some("asia-east1"));
    }

    #[test]
    fn test_overrides() {
        let env = valid_env()
            .with(CLUSTER_NAME, "staging")
            .with(ARTIFACT_REPOSITORY, "agents")
            .with(IMAGE_TAG, "v2");
        let config = EnvironmentValidator::new().validate(&env).unwrap();
        assert_eq!(config.cluster_name(), "staging");
        assert_eq!(
            config.image_ref("audit-agent"),
            "us-central1-docker.pkg.dev/demo-1/agents/audit-agent:v2"
        );
    }

    #[test]
    fn test_non_numeric_interval_rejected() {
        for bad in ["soon", "0", "-5"] {
            let env = valid_env().with(MONITORING_INTERVAL, bad);
            let err = EnvironmentValidator::new().validate(&env).unwrap_err();
            assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);
            assert_eq!(err.config_key(), Some(MONITORING_INTERVAL));
        }
    }

    #[test]
    fn test_api_key_is_secret() {
        let config = EnvironmentValidator::new().validate(&valid_env()).unwrap();
        assert!(config.is_secret(GOOGLE_API_KEY));
        assert!(!config.is_secret(PROJECT_ID));
    }
}
