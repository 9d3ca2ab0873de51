//! # boa-deploy
//!
//! Provision a GKE Autopilot cluster, build and push container images, and
//! deploy Bank of Anthos together with the consent agent swarm.
//!
//! ## Usage
//!
//! ```bash
//! boa-deploy [check|cluster|images|deploy-boa|deploy-agents|all] [--dry-run] [--report run.json]
//! ```
//!
//! ## Modules
//!
//! - `cli` - Argument parsing and command routing
//! - `config` - Environment validation, `.env` layering and deploy settings
//! - `display` - Operator-facing progress lines
//! - `error` - Error types with stable codes and exit statuses
//! - `pipeline` - Stage catalog, deployment plans, execution and run reports
//! - `readiness` - Deadline-bounded waiting on Kubernetes workloads
//! - `stages` - Stage actions backed by gcloud, kubectl and docker
//! - `subprocess` - Subprocess abstraction layer with a mock for tests
//! - `template` - `${VAR}` manifest templates
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod readiness;
pub mod stages;
pub mod subprocess;
pub mod template;

pub use error::{DeployError, ErrorCode, Result};
