//! Command routing and execution

use std::path::Path;
use std::sync::Arc;

use crate::cli::args::Cli;
use crate::config::{DeploySettings, EnvReader, EnvironmentValidator, LayeredEnvReader};
use crate::display::ProgressDisplay;
use crate::error::{DeployError, Result};
use crate::pipeline::{catalog, DeployCommand, DeploymentPlan, PipelineReport, StageId};
use crate::stages::pipeline_executor;
use crate::subprocess::SubprocessManager;

const DEFAULT_ENV_FILE: &str = ".env";

/// Resolve the command, load configuration sources and run (or describe)
/// the plan.
pub async fn execute_command(
    cli: &Cli,
    manager: SubprocessManager,
    display: Arc<dyn ProgressDisplay>,
) -> Result<()> {
    let (command, unknown) = DeployCommand::resolve(cli.command.as_deref(), cli.strict)?;
    if let Some(token) = unknown {
        display.warning(&format!(
            "Unknown command '{}', running the full pipeline (use --strict to reject)",
            token
        ));
    }

    let mut report = PipelineReport::new(command.token());
    let result = run_plan(cli, command, manager, Arc::clone(&display), &mut report).await;

    if let (Some(path), false) = (&cli.report, cli.dry_run) {
        if report.finished_at.is_none() {
            report.finish(result.as_ref().err());
        }
        write_report(&report, path, display.as_ref());
    }
    result
}

async fn run_plan(
    cli: &Cli,
    command: DeployCommand,
    manager: SubprocessManager,
    display: Arc<dyn ProgressDisplay>,
    report: &mut PipelineReport,
) -> Result<()> {
    let settings = DeploySettings::load(cli.settings.as_deref())?;
    let env: Arc<dyn EnvReader> = Arc::new(match &cli.env_file {
        Some(path) => LayeredEnvReader::from_env_file(path, true)?,
        None => LayeredEnvReader::from_env_file(Path::new(DEFAULT_ENV_FILE), false)?,
    });
    let plan = DeploymentPlan::for_command(command, catalog(&settings));

    if cli.dry_run {
        return dry_run(&plan, env.as_ref(), display.as_ref());
    }

    tracing::debug!("Running plan {:?}", plan.stage_ids());
    pipeline_executor(manager, settings, env, display)
        .run(&plan, report)
        .await
}

/// Validate and describe without invoking any external command
fn dry_run(
    plan: &DeploymentPlan,
    env: &dyn EnvReader,
    display: &dyn ProgressDisplay,
) -> Result<()> {
    if plan.contains(StageId::Validate) {
        let config = EnvironmentValidator::new().validate(env)?;
        display.success("Configuration is valid");
        for (key, value) in config.display_entries() {
            display.info(&format!("  {}={}", key, value));
        }
    }

    for line in plan.describe() {
        display.info(&line);
    }
    display.success("Dry run complete, no external commands were run");
    Ok(())
}

fn write_report(report: &PipelineReport, path: &Path, display: &dyn ProgressDisplay) {
    match report.write_to(path) {
        Ok(()) => display.info(&format!("Run report written to {}", path.display())),
        Err(e) => display.warning(&e.to_string()),
    }
}

/// Print a fatal error the way operators see it
pub fn report_error(err: &DeployError, display: &dyn ProgressDisplay) {
    display.error(&err.user_message());
    if let Some(remediation) = err.remediation() {
        display.info(&format!("To fix: {}", remediation));
    }
    tracing::debug!("{}", err.developer_message());
}
