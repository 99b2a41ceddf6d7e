//! Trawler CLI - Command-line interface
//!
//! Drives the resolution worker and exposes one-shot helpers for the
//! torrent pipeline.

mod commands;

use clap::Parser;
use trawler_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "trawler")]
#[command(about = "Resolves media requests into swarm-checked magnet links")]
struct Cli {
    /// Console log verbosity
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_level.as_tracing_level(), None) {
        eprintln!("Failed to initialize tracing: {e}");
        return std::process::ExitCode::FAILURE;
    }

    match commands::handle_command(cli.command).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            if e.is_user_error() {
                std::process::ExitCode::from(2)
            } else {
                std::process::ExitCode::FAILURE
            }
        }
    }
}
