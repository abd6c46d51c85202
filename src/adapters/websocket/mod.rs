//! WebSocket adapters for the duplex echo relay.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                axum router  (GET /ws, GET /health)                  │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │ upgrade
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     one echo engine per socket                      │
//! │   read task ──► dispatch loop ──► writer task                       │
//! │        ▲               ▲                                            │
//! │        └── socket      └── process shutdown watch                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Connections share nothing but the read-only relay configuration and the
//! shutdown receiver.
//!
//! # Components
//!
//! - [`connection`] - Read/dispatch/write tasks for one connection
//! - [`handler`] - Axum upgrade handler, router, and server loop

pub mod connection;
pub mod handler;

pub use connection::{run_connection, ConnectionLimits};
pub use handler::{accept, relay_router, serve, ws_handler, RelayState};
