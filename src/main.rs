use boa_deploy::cli::{execute_command, get_log_level, report_error, Cli};
use boa_deploy::display::{ConsoleDisplay, ProgressDisplay};
use boa_deploy::subprocess::SubprocessManager;
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(get_log_level(cli.verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .with_line_number(cli.verbose >= 3)
        .init();

    debug!("boa-deploy started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let display: Arc<dyn ProgressDisplay> = Arc::new(ConsoleDisplay::new());
    let result = execute_command(
        &cli,
        SubprocessManager::production(),
        Arc::clone(&display),
    )
    .await;

    if let Err(e) = result {
        report_error(&e, display.as_ref());
        std::process::exit(e.exit_code());
    }
}
