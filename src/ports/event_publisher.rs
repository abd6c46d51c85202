//! EventPublisher port - Interface for publishing events to the broker.
//!
//! This port defines how the creation path emits events without knowing
//! about the underlying transport (Kafka, in-memory).

use async_trait::async_trait;

use crate::domain::events::{Delivery, TopicPartition};
use crate::domain::foundation::DomainError;

/// Port for publishing opaque events to a topic partition.
///
/// Opening is the adapter's constructor and fails with
/// `ErrorCode::BrokerConnection` when the broker is unreachable.
///
/// Implementations must ensure:
/// - Exactly one message is emitted per `publish` call (no batching)
/// - No retries; a failed send surfaces as `ErrorCode::DeliveryFailed`
/// - `close` is idempotent and never fails; close errors are logged
///
/// # Example
///
/// ```ignore
/// let target = TopicPartition::new("registration-topic", 0)?;
/// let delivery = publisher.publish(&target, b"user@example.com").await?;
/// tracing::info!(%delivery, "event published");
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event and wait for the broker acknowledgement.
    async fn publish(&self, target: &TopicPartition, payload: &[u8])
        -> Result<Delivery, DomainError>;

    /// Release the broker connection.
    async fn close(&self);
}
