//! Command-line surface: argument parsing, help text and routing

pub mod args;
pub mod help;
pub mod router;

pub use args::Cli;
pub use help::get_log_level;
pub use router::{execute_command, report_error};
