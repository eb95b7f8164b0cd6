//! relay-client: send typed lines to the relay server until "exit".

use line_relay::config::ClientConfig;
use line_relay::protocol::CLIENT_BANNER;
use line_relay::{logging, Client, RelayError};
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
    let config = ClientConfig::load()?;

    // Initialize logging
    logging::init(&config.log_level);

    println!("{CLIENT_BANNER}");

    let client = Client::connect(&config)?;
    let session = client.run(&mut std::io::stdin().lock(), &mut std::io::stdout().lock())?;

    info!(
        reason = ?session.close_reason(),
        messages = session.messages(),
        "Client shutting down"
    );
    Ok(())
}
