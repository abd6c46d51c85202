//! WebSocket upgrade handler and relay server.
//!
//! Handles the HTTP → WebSocket upgrade and hands the socket to the echo
//! engine in [`super::connection`]:
//! 1. Upgrade with the configured write buffer size
//! 2. Split the socket into read and write halves
//! 3. Echo until read error (reserved opcodes included), client close, or shutdown

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};
use futures::StreamExt;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::domain::foundation::ConnectionId;
use crate::shutdown::{self, ShutdownReceiver};

use super::connection::{run_connection, ConnectionLimits};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct RelayState {
    /// Relay settings shared by every connection.
    pub config: Arc<RelayConfig>,
    /// Process shutdown signal; each connection watches its own clone.
    pub shutdown: ShutdownReceiver,
}

impl RelayState {
    /// Create a new relay state.
    pub fn new(config: RelayConfig, shutdown: ShutdownReceiver) -> Self {
        Self {
            config: Arc::new(config),
            shutdown,
        }
    }

    fn limits(&self) -> ConnectionLimits {
        ConnectionLimits {
            handoff_capacity: self.config.handoff_capacity,
            outbound_capacity: self.config.outbound_capacity,
        }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET {relay.path}` (default `/ws`)
///
/// No authentication or origin checks are performed.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> Response {
    ws.write_buffer_size(state.config.write_buffer_size)
        .on_upgrade(move |socket| accept(socket, state))
}

/// Own an upgraded connection until it closes.
pub async fn accept(socket: WebSocket, state: RelayState) {
    let id = ConnectionId::new();
    let limits = state.limits();
    let (writer, reader) = socket.split();

    let reason = run_connection(id, reader, writer, limits, state.shutdown).await;
    debug!(connection_id = %id, %reason, "Handler returned");
}

async fn health() -> &'static str {
    "ok"
}

/// Create axum router for the relay endpoint.
///
/// # Example
///
/// ```ignore
/// let (_tx, rx) = shutdown::channel();
/// let app = relay_router(RelayState::new(RelayConfig::default(), rx));
/// ```
pub fn relay_router(state: RelayState) -> Router {
    let path = state.config.path.clone();

    Router::new()
        .route(&path, get(ws_handler))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Serve the relay on `listener` until shutdown is requested.
///
/// Open connections observe the same signal and close themselves.
pub async fn serve(listener: TcpListener, state: RelayState) -> std::io::Result<()> {
    let mut shutdown = state.shutdown.clone();
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, path = %state.config.path, "Server up");
    }

    axum::serve(listener, relay_router(state))
        .with_graceful_shutdown(async move { shutdown::requested(&mut shutdown).await })
        .await
}
