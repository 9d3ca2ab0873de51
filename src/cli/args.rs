//! CLI argument structures

use clap::Parser;
use std::path::PathBuf;

use super::help::COMMANDS_HELP;

/// Stand up Bank of Anthos and the consent agent swarm on GKE Autopilot
#[derive(Parser, Debug)]
#[command(name = "boa-deploy")]
#[command(about = "boa-deploy - Provision, build and deploy Bank of Anthos with consent agents", long_about = None)]
#[command(after_help = COMMANDS_HELP)]
#[command(version)]
pub struct Cli {
    /// What to run; defaults to the full pipeline
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Environment file read under the process environment [default: .env]
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// TOML file overriding the built-in deployment layout
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Reject unknown commands instead of running the full pipeline
    #[arg(long)]
    pub strict: bool,

    /// Validate configuration and print the plan without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}
