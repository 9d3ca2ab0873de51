use std::path::Path;

use crate::config::{AgentSettings, BaseAppSettings, Configuration};
use crate::display::ProgressDisplay;
use crate::error::{DeployError, ErrorCode, Result};
use crate::pipeline::{CreateOutcome, IdempotencyPolicy, StageOutcome};
use crate::subprocess::{KubectlRunner, ProcessError};
use crate::template::{check_yaml, ManifestTemplate};

fn apply_error(manifest: &str, e: ProcessError) -> DeployError {
    DeployError::apply(ErrorCode::APPLY_REJECTED, "kubectl apply failed", manifest)
        .with_context(&e)
        .with_source(e)
}

fn log_applied(summary: &str) {
    for line in summary.lines().filter(|l| !l.trim().is_empty()) {
        tracing::debug!("kubectl: {}", line);
    }
}

async fn apply_path(
    kubectl: &dyn KubectlRunner,
    path: &Path,
    display: &dyn ProgressDisplay,
) -> Result<()> {
    let shown = path.display().to_string();
    if !path.exists() {
        return Err(DeployError::apply(
            ErrorCode::APPLY_REJECTED,
            "manifest path does not exist",
            &shown,
        ));
    }

    display.info(&format!("Applying {}", shown));
    let summary = kubectl
        .apply_path(path)
        .await
        .map_err(|e| apply_error(&shown, e))?;
    log_applied(&summary);
    Ok(())
}

/// Apply the prerequisite extras, then the base manifest directory.
/// No templating is involved.
pub async fn deploy_base(
    kubectl: &dyn KubectlRunner,
    base: &BaseAppSettings,
    display: &dyn ProgressDisplay,
) -> Result<StageOutcome> {
    for extra in &base.extras {
        apply_path(kubectl, extra, display).await?;
    }
    apply_path(kubectl, &base.manifests, display).await?;

    display.success("Base application manifests applied");
    Ok(StageOutcome::default())
}

/// Render the agent template, make sure the namespace exists, apply.
///
/// The template is rendered and checked before anything touches the
/// cluster, so a bad template leaves no partial state behind.
pub async fn deploy_agents(
    kubectl: &dyn KubectlRunner,
    config: &Configuration,
    agents: &AgentSettings,
    policy: IdempotencyPolicy,
    display: &dyn ProgressDisplay,
) -> Result<StageOutcome> {
    let template = ManifestTemplate::from_file(&agents.template)?;
    let rendered = template.render(config.values())?;
    let documents = check_yaml(template.name(), &rendered)?;
    tracing::debug!(
        "Rendered {} into {} document(s)",
        template.name(),
        documents
    );

    let mut outcome = StageOutcome::default();
    let namespace = &agents.namespace;
    let label = format!("kubectl create namespace {}", namespace);
    let created = kubectl
        .create_namespace(namespace)
        .await
        .and_then(|output| policy.resolve(&label, output))
        .map_err(|e| {
            DeployError::apply(
                ErrorCode::APPLY_NAMESPACE,
                "cannot create namespace",
                namespace,
            )
            .with_context(&e)
            .with_source(e)
        })?;
    match created {
        CreateOutcome::Created => display.info(&format!("Created namespace {}", namespace)),
        CreateOutcome::AlreadyExisted => {
            outcome.warn(display, format!("Namespace {} already exists", namespace))
        }
    }

    display.info(&format!("Applying {}", template.name()));
    let summary = kubectl
        .apply_document(rendered)
        .await
        .map_err(|e| apply_error(template.name(), e))?;
    log_applied(&summary);

    display.success("Agent manifests applied");
    Ok(outcome)
}
