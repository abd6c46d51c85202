//! courier-relay - WebSocket echo relay.
//!
//! Binds the configured address, echoes frames on `relay.path`, and stops on
//! SIGINT/SIGTERM after giving open connections the shutdown timeout.

use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use courier::adapters::websocket::{serve, RelayState};
use courier::config::{AppConfig, ServerConfig};
use courier::shutdown;
use courier::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load_validated() {
        Ok(config) => config,
        Err(e) => {
            let _ = telemetry::init_tracing(&ServerConfig::default());
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = telemetry::init_tracing(&config.server) {
        eprintln!("Failed to install tracing subscriber: {e}");
    }

    let addr = match config.server.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, "Invalid bind address");
            return ExitCode::FAILURE;
        }
    };
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    let (tx, rx) = shutdown::channel();
    let mut stop = rx.clone();
    shutdown::spawn_signal_listener(tx);

    let mut server = tokio::spawn(serve(listener, RelayState::new(config.relay.clone(), rx)));

    tokio::select! {
        joined = &mut server => return exit_code(joined),
        _ = shutdown::requested(&mut stop) => {}
    }

    info!(timeout = ?config.server.shutdown_timeout(), "Shutting down relay");
    match tokio::time::timeout(config.server.shutdown_timeout(), server).await {
        Ok(joined) => exit_code(joined),
        Err(_) => {
            warn!("Shutdown timed out with connections still open");
            ExitCode::SUCCESS
        }
    }
}

fn exit_code(joined: Result<std::io::Result<()>, JoinError>) -> ExitCode {
    match joined {
        Ok(Ok(())) => {
            info!("Relay stopped");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Server task failed");
            ExitCode::FAILURE
        }
    }
}
