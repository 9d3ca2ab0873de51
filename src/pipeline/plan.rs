//! Command dispatch: operator token to deployment plan

use std::fmt;
use std::str::FromStr;

use super::stage::{Stage, StageId};
use crate::error::{DeployError, Result};

/// Subcommands understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployCommand {
    Check,
    Cluster,
    Images,
    DeployBase,
    DeployAgents,
    All,
}

impl DeployCommand {
    pub const TOKENS: [&'static str; 6] = [
        "check",
        "cluster",
        "images",
        "deploy-boa",
        "deploy-agents",
        "all",
    ];

    pub fn token(&self) -> &'static str {
        match self {
            DeployCommand::Check => "check",
            DeployCommand::Cluster => "cluster",
            DeployCommand::Images => "images",
            DeployCommand::DeployBase => "deploy-boa",
            DeployCommand::DeployAgents => "deploy-agents",
            DeployCommand::All => "all",
        }
    }

    /// Stages this command runs, in pipeline order
    pub fn stages(&self) -> &'static [StageId] {
        use StageId::*;
        match self {
            DeployCommand::Check => &[Prerequisites],
            DeployCommand::Cluster => &[Validate, Prerequisites, Project, Cluster],
            DeployCommand::Images => &[Validate, Prerequisites, Project, Images],
            DeployCommand::DeployBase => &[Validate, Prerequisites, BaseApp],
            DeployCommand::DeployAgents => &[Validate, Prerequisites, AgentSwarm],
            DeployCommand::All => &StageId::ALL,
        }
    }

    /// Resolve an optional operator token.
    ///
    /// An absent token means the full pipeline. An unknown token also falls
    /// back to the full pipeline and is returned so the caller can warn,
    /// unless `strict` is set, in which case it is a usage error.
    pub fn resolve(token: Option<&str>, strict: bool) -> Result<(Self, Option<String>)> {
        let Some(token) = token else {
            return Ok((DeployCommand::All, None));
        };

        match token.parse::<DeployCommand>() {
            Ok(command) => Ok((command, None)),
            Err(_) if strict => Err(DeployError::usage(format!(
                "Unknown command '{}'. Expected one of: {}",
                token,
                Self::TOKENS.join(", ")
            ))),
            Err(_) => Ok((DeployCommand::All, Some(token.to_string()))),
        }
    }
}

impl FromStr for DeployCommand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "check" => Ok(DeployCommand::Check),
            "cluster" => Ok(DeployCommand::Cluster),
            "images" => Ok(DeployCommand::Images),
            "deploy-boa" => Ok(DeployCommand::DeployBase),
            "deploy-agents" => Ok(DeployCommand::DeployAgents),
            "all" => Ok(DeployCommand::All),
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

impl fmt::Display for DeployCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The concrete stages selected for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentPlan {
    pub command: DeployCommand,
    pub stages: Vec<Stage>,
}

impl DeploymentPlan {
    /// Select the command's stages from `catalog`, keeping catalog order
    pub fn for_command(command: DeployCommand, catalog: Vec<Stage>) -> Self {
        let wanted = command.stages();
        let stages = catalog
            .into_iter()
            .filter(|stage| wanted.contains(&stage.id))
            .collect();
        Self { command, stages }
    }

    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|s| s.id).collect()
    }

    pub fn contains(&self, id: StageId) -> bool {
        self.stages.iter().any(|s| s.id == id)
    }

    /// Human-readable rendering for `--dry-run`
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Plan for '{}': {} stage(s)",
            self.command,
            self.stages.len()
        )];

        for (index, stage) in self.stages.iter().enumerate() {
            let deps = if stage.dependencies.is_empty() {
                "none".to_string()
            } else {
                stage
                    .dependencies
                    .iter()
                    .map(StageId::name)
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let duplicates = if stage.idempotency.creates() {
                format!("; duplicates: {}", stage.idempotency)
            } else {
                String::new()
            };
            lines.push(format!(
                "  {}. {} - {} (after: {}{})",
                index + 1,
                stage.id,
                stage.id.description(),
                deps,
                duplicates
            ));
            for condition in &stage.readiness {
                lines.push(format!("       wait for {}", condition));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeploySettings;
    use crate::error::ErrorCode;
    use crate::pipeline::stage::catalog;

    fn plan(command: DeployCommand) -> DeploymentPlan {
        DeploymentPlan::for_command(command, catalog(&DeploySettings::default()))
    }

    #[test]
    fn test_check_runs_prerequisites_only() {
        assert_eq!(plan(DeployCommand::Check).stage_ids(), vec![StageId::Prerequisites]);
    }

    #[test]
    fn test_cluster_plan() {
        assert_eq!(
            plan(DeployCommand::Cluster).stage_ids(),
            vec![
                StageId::Validate,
                StageId::Prerequisites,
                StageId::Project,
                StageId::Cluster
            ]
        );
    }

    #[test]
    fn test_images_plan_skips_cluster() {
        let images = plan(DeployCommand::Images);
        assert!(images.contains(StageId::Project));
        assert!(images.contains(StageId::Images));
        assert!(!images.contains(StageId::Cluster));
    }

    #[test]
    fn test_deploy_plans() {
        assert_eq!(
            plan(DeployCommand::DeployBase).stage_ids(),
            vec![StageId::Validate, StageId::Prerequisites, StageId::BaseApp]
        );
        assert_eq!(
            plan(DeployCommand::DeployAgents).stage_ids(),
            vec![StageId::Validate, StageId::Prerequisites, StageId::AgentSwarm]
        );
    }

    #[test]
    fn test_all_plan_is_full_catalog() {
        assert_eq!(plan(DeployCommand::All).stage_ids(), StageId::ALL.to_vec());
    }

    #[test]
    fn test_resolve_tokens() {
        for token in DeployCommand::TOKENS {
            let (command, unknown) = DeployCommand::resolve(Some(token), true).unwrap();
            assert_eq!(command.token(), token);
            assert!(unknown.is_none());
        }

        let (command, unknown) = DeployCommand::resolve(None, true).unwrap();
        assert_eq!(command, DeployCommand::All);
        assert!(unknown.is_none());
    }

    #[test]
    fn test_unknown_token_falls_back_to_all() {
        let (command, unknown) = DeployCommand::resolve(Some("deploy"), false).unwrap();
        assert_eq!(command, DeployCommand::All);
        assert_eq!(unknown.as_deref(), Some("deploy"));
    }

    #[test]
    fn test_unknown_token_strict_is_usage_error() {
        let err = DeployCommand::resolve(Some("deploy"), true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::USAGE_UNKNOWN_COMMAND);
        assert_eq!(err.exit_code(), 64);
        assert!(err.to_string().contains("deploy-agents"));
    }

    #[test]
    fn test_describe_lists_stages_and_waits() {
        let lines = plan(DeployCommand::DeployBase).describe();
        assert_eq!(lines[0], "Plan for 'deploy-boa': 3 stage(s)");
        assert!(lines[1].contains("1. validate"));
        assert!(lines
            .iter()
            .any(|l| l.contains("base-app") && l.ends_with("(after: validate, prerequisites)")));
        assert!(!lines[1].contains("duplicates"));
        assert!(lines
            .iter()
            .any(|l| l.contains("wait for statefulset/accounts-db in default")));

        let agents = plan(DeployCommand::DeployAgents).describe();
        assert!(agents
            .iter()
            .any(|l| l.contains("agent-swarm") && l.contains("duplicates: treat-duplicate-as-success")));
    }
}
