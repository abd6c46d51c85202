//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the pipeline to external systems:
//! - `events` - Broker implementations (Kafka, in-memory)
//! - `notification` - Notification actions
//! - `websocket` - Duplex echo relay over axum WebSockets

pub mod events;
pub mod notification;
pub mod websocket;

pub use events::{InMemoryBroker, KafkaEventPublisher, KafkaEventSource};
pub use notification::LogNotifier;
