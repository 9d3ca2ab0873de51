//! Help text and verbosity mapping

pub const COMMANDS_HELP: &str = "\
Commands:
  check          Check required tools and gcloud authentication
  cluster        Validate, check, prepare the project, create the cluster
  images         Validate, check, prepare the project, build and push images
  deploy-boa     Validate, check, deploy Bank of Anthos and wait for it
  deploy-agents  Validate, check, deploy the agent swarm and wait for it
  all            Everything above in order (default)

Configuration is read from the environment and the .env file.
Required: PROJECT_ID, GOOGLE_API_KEY.";

/// Get the log filter for a verbosity count
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,tower=debug",
    }
}
