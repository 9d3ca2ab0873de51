use crate::display::ProgressDisplay;
use crate::error::{DeployError, ErrorCode, Result};
use crate::pipeline::StageOutcome;
use crate::subprocess::{GcloudRunner, SubprocessManager};

/// Where to get a missing tool
pub fn install_hint(tool: &str) -> String {
    match tool {
        "gcloud" => "Install the Google Cloud SDK: https://cloud.google.com/sdk/docs/install".into(),
        "kubectl" => "gcloud components install kubectl".into(),
        "docker" => "Install Docker: https://docs.docker.com/get-docker/".into(),
        other => format!("Install {} and make sure it is on your PATH", other),
    }
}

/// Confirm every tool resolves on PATH, then that gcloud has an active
/// account. Stops at the first unmet check.
pub async fn check(
    manager: &SubprocessManager,
    gcloud: &dyn GcloudRunner,
    tools: &[String],
    display: &dyn ProgressDisplay,
) -> Result<StageOutcome> {
    for tool in tools {
        let found = manager.which(tool).await?;
        if !found {
            return Err(DeployError::prerequisite(
                ErrorCode::PREREQ_TOOL_MISSING,
                format!("{} is not installed or not on PATH", tool),
                install_hint(tool),
            ));
        }
        tracing::debug!("Found {} on PATH", tool);
    }
    display.info(&format!("Tools available: {}", tools.join(", ")));

    let account = gcloud.active_account().await.map_err(|e| {
        tracing::debug!("gcloud auth list failed: {}", e);
        DeployError::prerequisite(
            ErrorCode::PREREQ_NOT_AUTHENTICATED,
            format!("cannot determine the active gcloud account ({})", e),
            "gcloud auth login",
        )
    })?;

    match account {
        Some(account) => {
            display.success(&format!("Authenticated as {}", account));
            let mut outcome = StageOutcome::default();
            outcome.note(format!("gcloud account {}", account));
            Ok(outcome)
        }
        None => Err(DeployError::prerequisite(
            ErrorCode::PREREQ_NOT_AUTHENTICATED,
            "no active gcloud account",
            "gcloud auth login",
        )),
    }
}
