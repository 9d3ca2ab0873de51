use crate::config::{ClusterSettings, Configuration};
use crate::display::ProgressDisplay;
use crate::error::{DeployError, ErrorCode, Result};
use crate::pipeline::{CreateOutcome, IdempotencyPolicy, StageOutcome};
use crate::subprocess::{ClusterSpec, GcloudRunner};

use super::provisioning_error;

/// Statuses in which an existing cluster is reused as is
const USABLE_STATUSES: &[&str] = &["RUNNING", "RECONCILING"];

/// Create the Autopilot cluster unless a usable one exists, then fetch
/// kubectl credentials for it.
pub async fn provision(
    gcloud: &dyn GcloudRunner,
    config: &Configuration,
    cluster: &ClusterSettings,
    policy: IdempotencyPolicy,
    display: &dyn ProgressDisplay,
) -> Result<StageOutcome> {
    let project = config.project_id();
    let location = config.region();
    let name = config.cluster_name();
    let mut outcome = StageOutcome::default();

    let status = gcloud
        .cluster_status(project, location, name)
        .await
        .map_err(|e| {
            provisioning_error(
                ErrorCode::PROVISION_CLUSTER_CREATE,
                "cannot query cluster status",
                name,
                e,
            )
        })?;

    match status.as_deref() {
        Some(status) if USABLE_STATUSES.contains(&status) => {
            display.info(&format!(
                "Cluster {} already exists ({}), skipping creation",
                name, status
            ));
        }
        Some(status) => {
            return Err(DeployError::provisioning(
                ErrorCode::PROVISION_CLUSTER_UNHEALTHY,
                format!("cluster exists but is {}", status),
                name,
            )
            .with_remediation(format!(
                "gcloud container clusters describe {} --region={} --project={}",
                name, location, project
            )));
        }
        None => {
            display.info(&format!(
                "Creating Autopilot cluster {} in {} (this takes several minutes)",
                name, location
            ));
            let spec = ClusterSpec {
                project: project.to_string(),
                location: location.to_string(),
                name: name.to_string(),
                private_nodes: cluster.private_nodes,
                release_channel: cluster.release_channel.clone(),
            };
            let label = format!("gcloud container clusters create-auto {}", name);
            let created = gcloud
                .create_autopilot_cluster(&spec)
                .await
                .and_then(|output| policy.resolve(&label, output))
                .map_err(|e| {
                    provisioning_error(
                        ErrorCode::PROVISION_CLUSTER_CREATE,
                        "cluster creation failed",
                        name,
                        e,
                    )
                })?;

            match created {
                CreateOutcome::Created => {
                    display.success(&format!("Cluster {} created", name));
                }
                CreateOutcome::AlreadyExisted => {
                    outcome.warn(
                        display,
                        format!("Cluster {} was created concurrently, reusing it", name),
                    );
                }
            }
        }
    }

    gcloud
        .get_credentials(project, location, name)
        .await
        .map_err(|e| {
            provisioning_error(
                ErrorCode::PROVISION_CREDENTIALS,
                "cannot fetch cluster credentials",
                name,
                e,
            )
        })?;
    display.success(&format!("kubectl is configured for cluster {}", name));
    outcome.note(format!("cluster {} in {}", name, location));

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvironmentValidator, MapEnvReader};
    use crate::display::RecordingDisplay;
    use crate::subprocess::SubprocessManager;

    fn config() -> Configuration {
        EnvironmentValidator::new()
            .validate(
                &MapEnvReader::new()
                    .with("PROJECT_ID", "demo-1")
                    .with("GOOGLE_API_KEY", "key"),
            )
            .unwrap()
    }

    fn is(verb: &'static str) -> impl Fn(&[String]) -> bool + Send + Sync + 'static {
        move |args: &[String]| args.get(2).map(String::as_str) == Some(verb)
    }

    #[tokio::test]
    async fn test_creates_missing_cluster() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud")
            .with_args(is("describe"))
            .returns_exit_code(1)
            .returns_stderr("ERROR: ResponseError: code=404, message=Not found")
            .finish();
        mock.expect_command("gcloud").finish();

        provision(
            &manager.gcloud(),
            &config(),
            &ClusterSettings::default(),
            IdempotencyPolicy::TreatDuplicateAsSuccess,
            &RecordingDisplay::new(),
        )
        .await
        .unwrap();

        assert!(mock.was_called_with("gcloud", |args| args.contains(&"create-auto".to_string())
            && args.contains(&"--enable-private-nodes".to_string())));
        assert!(mock.was_called_with("gcloud", is("get-credentials")));
    }

    #[tokio::test]
    async fn test_running_cluster_is_reused() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud")
            .with_args(is("describe"))
            .returns_stdout("RUNNING\n")
            .finish();
        mock.expect_command("gcloud").finish();
        let display = RecordingDisplay::new();

        let outcome = provision(
            &manager.gcloud(),
            &config(),
            &ClusterSettings::default(),
            IdempotencyPolicy::TreatDuplicateAsSuccess,
            &display,
        )
        .await
        .unwrap();

        assert!(outcome.warnings.is_empty());
        assert!(!mock.was_called_with("gcloud", is("create-auto")));
        assert!(mock.was_called_with("gcloud", is("get-credentials")));
        assert!(display.contains("skipping creation"));
    }

    #[tokio::test]
    async fn test_degraded_cluster_is_fatal() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud")
            .with_args(is("describe"))
            .returns_stdout("ERROR\n")
            .finish();
        mock.expect_command("gcloud").finish();

        let err = provision(
            &manager.gcloud(),
            &config(),
            &ClusterSettings::default(),
            IdempotencyPolicy::TreatDuplicateAsSuccess,
            &RecordingDisplay::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::PROVISION_CLUSTER_UNHEALTHY);
        assert!(err.remediation().unwrap().contains("clusters describe boa-consent-cluster"));
        assert!(!mock.was_called_with("gcloud", is("get-credentials")));
    }

    #[tokio::test]
    async fn test_concurrent_create_absorbed() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud")
            .with_args(is("describe"))
            .returns_exit_code(1)
            .returns_stderr("NOT_FOUND")
            .finish();
        mock.expect_command("gcloud")
            .with_args(is("create-auto"))
            .returns_exit_code(1)
            .returns_stderr("ERROR: Already exists: cluster boa-consent-cluster already exists")
            .finish();
        mock.expect_command("gcloud").finish();

        let outcome = provision(
            &manager.gcloud(),
            &config(),
            &ClusterSettings::default(),
            IdempotencyPolicy::TreatDuplicateAsSuccess,
            &RecordingDisplay::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
    }
}
