use crate::config::Configuration;
use crate::display::ProgressDisplay;
use crate::error::{ErrorCode, Result};
use crate::pipeline::{CreateOutcome, IdempotencyPolicy, StageOutcome};
use crate::subprocess::GcloudRunner;

use super::provisioning_error;

/// Point gcloud at the project, enable the APIs, create the image repository
pub async fn provision(
    gcloud: &dyn GcloudRunner,
    config: &Configuration,
    apis: &[String],
    policy: IdempotencyPolicy,
    display: &dyn ProgressDisplay,
) -> Result<StageOutcome> {
    let project = config.project_id();
    let mut outcome = StageOutcome::default();

    display.info(&format!("Setting active project to {}", project));
    gcloud.set_project(project).await.map_err(|e| {
        provisioning_error(ErrorCode::PROVISION_PROJECT_CONTEXT, "cannot set project", project, e)
            .with_remediation(format!("gcloud projects describe {}", project))
    })?;

    if !apis.is_empty() {
        display.info(&format!("Enabling APIs: {}", apis.join(", ")));
        gcloud.enable_services(project, apis).await.map_err(|e| {
            provisioning_error(ErrorCode::PROVISION_API_ENABLE, "cannot enable APIs", project, e)
                .with_remediation(format!(
                    "gcloud services enable {} --project={}",
                    apis.join(" "),
                    project
                ))
        })?;
    }

    let repository = config.repository();
    let location = config.region();
    display.info(&format!(
        "Creating artifact repository {} in {}",
        repository, location
    ));
    let label = format!("gcloud artifacts repositories create {}", repository);
    let created = gcloud
        .create_docker_repository(project, location, repository)
        .await
        .and_then(|output| policy.resolve(&label, output))
        .map_err(|e| {
            provisioning_error(
                ErrorCode::PROVISION_REPOSITORY,
                "cannot create artifact repository",
                repository,
                e,
            )
        })?;

    match created {
        CreateOutcome::Created => {
            display.success(&format!("Artifact repository {} created", repository));
        }
        CreateOutcome::AlreadyExisted => {
            outcome.warn(
                display,
                format!("Artifact repository {} already exists, reusing it", repository),
            );
        }
    }

    outcome.note(format!("registry {}", config.image_registry()));
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvironmentValidator, MapEnvReader};
    use crate::display::{RecordingDisplay, Severity};
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

    fn apis() -> Vec<String> {
        vec!["container.googleapis.com".into(), "compute.googleapis.com".into()]
    }

    #[tokio::test]
    async fn test_fresh_project() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud").finish();
        let display = RecordingDisplay::new();

        let outcome = provision(
            &manager.gcloud(),
            &config(),
            &apis(),
            IdempotencyPolicy::TreatDuplicateAsSuccess,
            &display,
        )
        .await
        .unwrap();

        assert!(outcome.warnings.is_empty());
        let history = mock.get_call_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].args, vec!["config", "set", "project", "demo-1"]);
        assert_eq!(
            history[1].args,
            vec![
                "services",
                "enable",
                "container.googleapis.com",
                "compute.googleapis.com",
                "--project=demo-1"
            ]
        );
        assert!(history[2].args.contains(&"--location=us-central1".to_string()));
        assert!(display.contains("Artifact repository consent-agents created"));
    }

    #[tokio::test]
    async fn test_existing_repository_is_warning() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud")
            .with_args(|args| args.first().map(String::as_str) == Some("artifacts"))
            .returns_exit_code(1)
            .returns_stderr("ERROR: ALREADY_EXISTS: the repository already exists")
            .finish();
        mock.expect_command("gcloud").finish();
        let display = RecordingDisplay::new();

        let outcome = provision(
            &manager.gcloud(),
            &config(),
            &apis(),
            IdempotencyPolicy::TreatDuplicateAsSuccess,
            &display,
        )
        .await
        .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(display.messages(Severity::Warn).len(), 1);
    }

    #[tokio::test]
    async fn test_repository_permission_error_is_fatal() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud")
            .with_args(|args| args.first().map(String::as_str) == Some("artifacts"))
            .returns_exit_code(1)
            .returns_stderr("ERROR: PERMISSION_DENIED: artifactregistry.repositories.create")
            .finish();
        mock.expect_command("gcloud").finish();

        let err = provision(
            &manager.gcloud(),
            &config(),
            &apis(),
            IdempotencyPolicy::TreatDuplicateAsSuccess,
            &RecordingDisplay::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::PROVISION_REPOSITORY);
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("PERMISSION_DENIED"));
    }

    #[tokio::test]
    async fn test_api_enable_failure_stops_before_repository() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud")
            .with_args(|args| args.first().map(String::as_str) == Some("services"))
            .returns_exit_code(1)
            .returns_stderr("billing account not configured")
            .finish();
        mock.expect_command("gcloud").finish();

        let err = provision(
            &manager.gcloud(),
            &config(),
            &apis(),
            IdempotencyPolicy::TreatDuplicateAsSuccess,
            &RecordingDisplay::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::PROVISION_API_ENABLE);
        assert!(!mock.was_called_with("gcloud", |args| args[0] == "artifacts"));
    }
}
