//! EventSource port - Interface for partition-level subscriptions.
//!
//! The consumer depends on this port only; Kafka and the in-memory broker
//! both implement it.

use async_trait::async_trait;

use crate::domain::events::{Event, StartOffset, TopicPartition};
use crate::domain::foundation::DomainError;

/// A live subscription to one topic partition.
///
/// `next_event` yields events in partition order and returns `None` once
/// the broker side has closed the subscription. After `None` is returned
/// every further call also returns `None`.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next event.
    async fn next_event(&mut self) -> Option<Event>;

    /// Release the subscription. Errors are logged, not returned.
    async fn close(&mut self);
}

/// Port for opening partition subscriptions on an established broker
/// connection.
///
/// # Example
///
/// ```ignore
/// let target = TopicPartition::new("registration-topic", 0)?;
/// let mut subscription = source.subscribe(&target, StartOffset::Newest).await?;
/// while let Some(event) = subscription.next_event().await {
///     // ...
/// }
/// ```
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a subscription on `target` beginning at `start`.
    ///
    /// Fails with `ErrorCode::SubscriptionFailed` when the partition cannot
    /// be assigned.
    async fn subscribe(
        &self,
        target: &TopicPartition,
        start: StartOffset,
    ) -> Result<Box<dyn Subscription>, DomainError>;

    /// Release the broker connection. Errors are logged, not returned.
    async fn close(&self);
}
