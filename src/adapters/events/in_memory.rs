//! In-memory broker implementation for tests and local runs.
//!
//! Keeps one append-only log per topic partition and fans new events out to
//! live subscriptions. Offsets are log positions, starting at zero.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::domain::events::{Delivery, Event, StartOffset, TopicPartition};
use crate::domain::foundation::DomainError;
use crate::ports::{EventPublisher, EventSource, Subscription};

#[derive(Default)]
struct PartitionLog {
    events: Vec<Vec<u8>>,
    subscribers: Vec<mpsc::UnboundedSender<Event>>,
}

/// In-memory broker implementing both broker ports.
///
/// Features:
/// - Newest/oldest start offsets with no gap between replay and live events
/// - Broker-side partition closure for subscription termination tests
/// - Switchable publish rejection for delivery failure tests
///
/// # Example
///
/// ```ignore
/// let broker = Arc::new(InMemoryBroker::new());
/// let mut sub = broker.subscribe(&target, StartOffset::Newest).await?;
/// broker.publish(&target, b"user@example.com").await?;
/// assert_eq!(sub.next_event().await.unwrap().payload, b"user@example.com");
/// ```
pub struct InMemoryBroker {
    partitions: Mutex<HashMap<TopicPartition, PartitionLog>>,
    reject_publishes: AtomicBool,
    closed: AtomicBool,
}

impl InMemoryBroker {
    /// Creates a new empty broker.
    pub fn new() -> Self {
        Self {
            partitions: Mutex::new(HashMap::new()),
            reject_publishes: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    // === Test Helpers ===

    /// Makes every subsequent publish fail with a delivery error.
    pub fn reject_publishes(&self, reject: bool) {
        self.reject_publishes.store(reject, Ordering::SeqCst);
    }

    /// Returns the payloads stored for a partition, in offset order.
    pub fn published(&self, target: &TopicPartition) -> Vec<Vec<u8>> {
        self.with_partitions(|partitions| {
            partitions
                .get(target)
                .map(|log| log.events.clone())
                .unwrap_or_default()
        })
    }

    /// Returns the number of live subscriptions on a partition.
    pub fn subscriber_count(&self, target: &TopicPartition) -> usize {
        self.with_partitions(|partitions| {
            partitions
                .get_mut(target)
                .map(|log| {
                    log.subscribers.retain(|tx| !tx.is_closed());
                    log.subscribers.len()
                })
                .unwrap_or(0)
        })
    }

    /// Ends every subscription on a partition, as a broker-side termination.
    pub fn close_partition(&self, target: &TopicPartition) {
        self.with_partitions(|partitions| {
            if let Some(log) = partitions.get_mut(target) {
                log.subscribers.clear();
            }
        });
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // A poisoned lock only means another test thread panicked mid-update;
    // the log itself is still consistent, so keep serving it.
    fn with_partitions<T>(&self, f: impl FnOnce(&mut HashMap<TopicPartition, PartitionLog>) -> T) -> T {
        let mut guard = match self.partitions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryBroker {
    async fn publish(
        &self,
        target: &TopicPartition,
        payload: &[u8],
    ) -> Result<Delivery, DomainError> {
        if self.is_closed() {
            return Err(DomainError::connection("in-memory broker is closed"));
        }
        if self.reject_publishes.load(Ordering::SeqCst) {
            return Err(DomainError::delivery("in-memory broker rejected message")
                .with_detail("topic", target.topic.clone()));
        }

        let delivery = self.with_partitions(|partitions| {
            let log = partitions.entry(target.clone()).or_default();
            let offset = log.events.len() as i64;
            log.events.push(payload.to_vec());

            let event = Event {
                topic: target.topic.clone(),
                partition: target.partition,
                offset,
                payload: payload.to_vec(),
            };
            log.subscribers.retain(|tx| tx.send(event.clone()).is_ok());

            Delivery {
                partition: target.partition,
                offset,
            }
        });

        Ok(delivery)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Subscription handed out by [`InMemoryBroker`].
pub struct InMemorySubscription {
    rx: mpsc::UnboundedReceiver<Event>,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn next_event(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}

#[async_trait]
impl EventSource for InMemoryBroker {
    async fn subscribe(
        &self,
        target: &TopicPartition,
        start: StartOffset,
    ) -> Result<Box<dyn Subscription>, DomainError> {
        if self.is_closed() {
            return Err(DomainError::subscription("in-memory broker is closed")
                .with_detail("partition", target.to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.with_partitions(|partitions| {
            let log = partitions.entry(target.clone()).or_default();
            if start == StartOffset::Oldest {
                for (offset, payload) in log.events.iter().enumerate() {
                    // Receiver is alive in this scope; send cannot fail.
                    let _ = tx.send(Event {
                        topic: target.topic.clone(),
                        partition: target.partition,
                        offset: offset as i64,
                        payload: payload.clone(),
                    });
                }
            }
            log.subscribers.push(tx);
        });

        Ok(Box::new(InMemorySubscription { rx }))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.with_partitions(|partitions| {
            for log in partitions.values_mut() {
                log.subscribers.clear();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TopicPartition {
        TopicPartition::new("registration-topic", 0).unwrap()
    }

    #[tokio::test]
    async fn publish_assigns_sequential_offsets() {
        let broker = InMemoryBroker::new();

        let first = broker.publish(&target(), b"a").await.unwrap();
        let second = broker.publish(&target(), b"b").await.unwrap();

        assert_eq!(first, Delivery { partition: 0, offset: 0 });
        assert_eq!(second.offset, 1);
        assert_eq!(broker.published(&target()), vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[tokio::test]
    async fn newest_subscription_skips_history() {
        let broker = InMemoryBroker::new();
        broker.publish(&target(), b"A").await.unwrap();

        let mut sub = EventSource::subscribe(&broker, &target(), StartOffset::Newest)
            .await
            .unwrap();
        broker.publish(&target(), b"B").await.unwrap();

        let event = sub.next_event().await.unwrap();
        assert_eq!(event.payload, b"B");
        assert_eq!(event.offset, 1);
    }

    #[tokio::test]
    async fn oldest_subscription_replays_history_then_live() {
        let broker = InMemoryBroker::new();
        broker.publish(&target(), b"A").await.unwrap();

        let mut sub = EventSource::subscribe(&broker, &target(), StartOffset::Oldest)
            .await
            .unwrap();
        broker.publish(&target(), b"B").await.unwrap();

        assert_eq!(sub.next_event().await.unwrap().payload, b"A");
        assert_eq!(sub.next_event().await.unwrap().payload, b"B");
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let broker = InMemoryBroker::new();
        let other = TopicPartition::new("registration-topic", 1).unwrap();

        let mut sub = EventSource::subscribe(&broker, &other, StartOffset::Newest)
            .await
            .unwrap();
        broker.publish(&target(), b"for-0").await.unwrap();
        broker.publish(&other, b"for-1").await.unwrap();

        assert_eq!(sub.next_event().await.unwrap().payload, b"for-1");
    }

    #[tokio::test]
    async fn close_partition_ends_subscription() {
        let broker = InMemoryBroker::new();
        let mut sub = EventSource::subscribe(&broker, &target(), StartOffset::Newest)
            .await
            .unwrap();

        broker.close_partition(&target());

        assert!(sub.next_event().await.is_none());
        assert!(sub.next_event().await.is_none());
    }

    #[tokio::test]
    async fn rejected_publish_is_delivery_error() {
        let broker = InMemoryBroker::new();
        broker.reject_publishes(true);

        let err = broker.publish(&target(), b"x").await.unwrap_err();

        assert_eq!(err.code, crate::domain::foundation::ErrorCode::DeliveryFailed);
        assert!(broker.published(&target()).is_empty());
    }

    #[tokio::test]
    async fn closed_broker_refuses_publish_and_subscribe() {
        let broker = InMemoryBroker::new();
        EventPublisher::close(&broker).await;

        assert!(broker.publish(&target(), b"x").await.is_err());
        assert!(EventSource::subscribe(&broker, &target(), StartOffset::Newest)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn dropped_subscriptions_are_pruned() {
        let broker = InMemoryBroker::new();
        let sub = EventSource::subscribe(&broker, &target(), StartOffset::Newest)
            .await
            .unwrap();
        assert_eq!(broker.subscriber_count(&target()), 1);

        drop(sub);

        assert_eq!(broker.subscriber_count(&target()), 0);
    }
}
