//! Application layer - The two ends of the event pipeline.
//!
//! Orchestrates ports without knowing which broker or action sits behind them:
//! - `CreationEventPublisher` - emits one event per created resource
//! - `NotificationConsumer` - turns consumed events into notifications

mod creation_events;
mod notification_consumer;

pub use creation_events::CreationEventPublisher;
pub use notification_consumer::{NotificationConsumer, DEFAULT_MAX_IN_FLIGHT};
