//! echo-once: a single-shot TCP echo server
//!
//! Accepts exactly one connection, reads bytes until the literal `<EOF>`
//! marker appears in the accumulated stream, echoes the whole message back
//! (marker included), and exits.
//!
//! Features:
//! - `<EOF>`-delimited message framing, robust to the marker arriving split
//!   across reads
//! - Configuration via CLI arguments or TOML file
//! - Structured logging of the connection lifecycle

mod config;
mod framing;
mod server;
mod session;

use config::Config;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        backlog = config.backlog,
        "Starting echo-once server"
    );

    // One session at a time, by design
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to build runtime");
            return ExitCode::FAILURE;
        }
    };

    // A failed session is logged inside run() and still exits cleanly;
    // only startup failures reach here.
    match runtime.block_on(server::run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
