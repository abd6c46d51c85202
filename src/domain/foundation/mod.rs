//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, error types, and the lifecycle state machine trait
//! shared by the relay and the event pipeline.

mod errors;
mod ids;
mod state_machine;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::ConnectionId;
pub use state_machine::StateMachine;
