//! Domain layer containing the message types and lifecycles.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, errors, state machine trait)
//! - `relay` - Frames and the per-connection lifecycle
//! - `events` - Broker events, delivery receipts, consumer lifecycle

pub mod events;
pub mod foundation;
pub mod relay;
