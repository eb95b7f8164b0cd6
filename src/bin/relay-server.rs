//! relay-server: accept one client and print what it sends.

use line_relay::config::ServerConfig;
use line_relay::protocol::SERVER_BANNER;
use line_relay::{logging, RelayError, Server};
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RelayError> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize logging
    logging::init(&config.log_level);

    println!("{SERVER_BANNER}");

    let server = Server::bind(&config)?;
    let session = server.run(&mut std::io::stdout().lock())?;

    info!(
        reason = ?session.close_reason(),
        messages = session.messages(),
        "Server shutting down"
    );
    Ok(())
}
