//! Broker adapters.
//!
//! Adapters implement the publishing and subscription ports for different
//! environments:
//!
//! - `InMemoryBroker` - In-process broker for tests and local runs
//! - `KafkaEventPublisher` - Long-lived Kafka producer
//! - `KafkaEventSource` - Partition-assigned Kafka consumer

mod in_memory;
mod kafka_publisher;
mod kafka_source;

pub use in_memory::{InMemoryBroker, InMemorySubscription};
pub use kafka_publisher::KafkaEventPublisher;
pub use kafka_source::{KafkaEventSource, KafkaSubscription};
