use crate::config::{Configuration, ImageSettings};
use crate::display::ProgressDisplay;
use crate::error::{DeployError, ErrorCode, Result};
use crate::pipeline::StageOutcome;
use crate::subprocess::{DockerRunner, GcloudRunner};

/// Configure registry auth, then build and push each image in order.
/// The first failure aborts the remaining images.
pub async fn build_and_push(
    gcloud: &dyn GcloudRunner,
    docker: &dyn DockerRunner,
    config: &Configuration,
    images: &ImageSettings,
    display: &dyn ProgressDisplay,
) -> Result<StageOutcome> {
    let host = config.registry_host();
    display.info(&format!("Configuring Docker credentials for {}", host));
    gcloud.configure_docker(&host).await.map_err(|e| {
        DeployError::build(
            ErrorCode::BUILD_REGISTRY_AUTH,
            "cannot configure registry credentials",
            &host,
        )
        .with_context(&e)
        .with_source(e)
    })?;

    let total = images.workloads.len();
    let mut outcome = StageOutcome::default();

    for (index, image) in images.workloads.iter().enumerate() {
        let reference = config.image_ref(&image.name);
        let dockerfile = images.dockerfile_for(image);

        display.info(&format!("Building {} ({}/{})", image.name, index + 1, total));
        docker
            .build(
                &reference,
                &dockerfile,
                &images.context,
                images.platform.as_deref(),
            )
            .await
            .map_err(|e| {
                DeployError::build(ErrorCode::BUILD_IMAGE_FAILED, "docker build failed", &reference)
                    .with_context(&e)
                    .with_source(e)
            })?;

        display.info(&format!("Pushing {}", reference));
        docker.push(&reference).await.map_err(|e| {
            DeployError::build(ErrorCode::BUILD_PUSH_FAILED, "docker push failed", &reference)
                .with_context(&e)
                .with_source(e)
        })?;

        display.success(&format!("Published {}", reference));
        outcome.note(reference);
    }

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
                    .with("GOOGLE_API_KEY", "key")
                    .with("IMAGE_TAG", "v1"),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_builds_and_pushes_in_order() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud").finish();
        mock.expect_command("docker").finish();

        let outcome = build_and_push(
            &manager.gcloud(),
            &manager.docker(),
            &config(),
            &ImageSettings::default(),
            &RecordingDisplay::new(),
        )
        .await
        .unwrap();

        let history = mock.get_call_history();
        assert_eq!(
            history[0].args,
            vec!["auth", "configure-docker", "us-central1-docker.pkg.dev", "--quiet"]
        );
        let docker_verbs: Vec<_> = history[1..]
            .iter()
            .map(|c| format!("{} {}", c.args[0], c.args[if c.args[0] == "build" { 2 } else { 1 }]))
            .collect();
        let registry = "us-central1-docker.pkg.dev/demo-1/consent-agents";
        assert_eq!(
            docker_verbs,
            vec![
                format!("build {}/monitoring-agent:v1", registry),
                format!("push {}/monitoring-agent:v1", registry),
                format!("build {}/validation-agent:v1", registry),
                format!("push {}/validation-agent:v1", registry),
                format!("build {}/audit-agent:v1", registry),
                format!("push {}/audit-agent:v1", registry),
                format!("build {}/streamlit-dashboard:v1", registry),
                format!("push {}/streamlit-dashboard:v1", registry),
            ]
        );
        assert_eq!(outcome.notes.len(), 4);
    }

    #[tokio::test]
    async fn test_second_build_failure_stops_remaining() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud").finish();
        mock.expect_command("docker")
            .with_args(|args| {
                args[0] == "build" && args.iter().any(|a| a.contains("validation-agent"))
            })
            .returns_exit_code(1)
            .returns_stderr("failed to solve: requirements.txt not found")
            .finish();
        mock.expect_command("docker").finish();

        let err = build_and_push(
            &manager.gcloud(),
            &manager.docker(),
            &config(),
            &ImageSettings::default(),
            &RecordingDisplay::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::BUILD_IMAGE_FAILED);
        assert!(err.user_message().contains("validation-agent"));
        // build+push of the first image, then the failed build
        assert!(mock.verify_called("docker", 3));
        assert!(!mock.was_called_with("docker", |args| args
            .iter()
            .any(|a| a.contains("audit-agent"))));
    }

    #[tokio::test]
    async fn test_registry_auth_failure() {
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command("gcloud")
            .returns_exit_code(1)
            .returns_stderr("credential helper error")
            .finish();

        let err = build_and_push(
            &manager.gcloud(),
            &manager.docker(),
            &config(),
            &ImageSettings::default(),
            &RecordingDisplay::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::BUILD_REGISTRY_AUTH);
        assert!(mock.verify_called("docker", 0));
    }
}
