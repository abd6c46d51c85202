//! Relay domain module.
//!
//! Frames carried over a persistent duplex connection, and the lifecycle
//! each connection moves through.

mod connection_state;
mod frame;

pub use connection_state::{CloseReason, ConnectionState};
pub use frame::{Frame, FrameKind};
