//! CreationEventPublisher - Fire-and-forget hook in the resource creation path.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::domain::events::TopicPartition;
use crate::ports::{EventPublisher, ResourceCreatedHook};

/// Emits one event per created resource to a fixed topic partition.
///
/// Holds a long-lived publisher shared by every creation. Publish failures
/// are logged and swallowed so the creation caller always succeeds.
pub struct CreationEventPublisher {
    publisher: Arc<dyn EventPublisher>,
    target: TopicPartition,
}

impl CreationEventPublisher {
    pub fn new(publisher: Arc<dyn EventPublisher>, target: TopicPartition) -> Self {
        Self { publisher, target }
    }

    pub fn target(&self) -> &TopicPartition {
        &self.target
    }

    /// Release the underlying publisher.
    pub async fn close(&self) {
        self.publisher.close().await;
    }
}

#[async_trait]
impl ResourceCreatedHook for CreationEventPublisher {
    async fn resource_created(&self, payload: &str) {
        match self.publisher.publish(&self.target, payload.as_bytes()).await {
            Ok(delivery) => {
                info!(
                    topic = %self.target.topic,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "Message stored in topic"
                );
            }
            Err(e) => {
                error!(
                    topic = %self.target.topic,
                    partition = self.target.partition,
                    error = %e,
                    "Fail send message to kafka"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryBroker;
    use crate::domain::events::StartOffset;
    use crate::ports::EventSource;

    fn target() -> TopicPartition {
        TopicPartition::new("registration-topic", 0).unwrap()
    }

    #[tokio::test]
    async fn created_resource_is_published_to_target() {
        let broker = Arc::new(InMemoryBroker::new());
        let hook = CreationEventPublisher::new(broker.clone(), target());

        hook.resource_created("user@example.com").await;

        assert_eq!(broker.published(&target()), vec![b"user@example.com".to_vec()]);
    }

    #[tokio::test]
    async fn publisher_is_reused_across_creations() {
        let broker = Arc::new(InMemoryBroker::new());
        let hook = CreationEventPublisher::new(broker.clone(), target());

        hook.resource_created("a@example.com").await;
        hook.resource_created("b@example.com").await;

        assert_eq!(broker.published(&target()).len(), 2);
    }

    #[tokio::test]
    async fn rejected_publish_does_not_fail_caller() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.reject_publishes(true);
        let hook = CreationEventPublisher::new(broker.clone(), target());

        // Returns unit; the creation path cannot observe the failure.
        hook.resource_created("user@example.com").await;

        assert!(broker.published(&target()).is_empty());
    }

    #[tokio::test]
    async fn live_subscriber_sees_created_resource() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut sub = EventSource::subscribe(broker.as_ref(), &target(), StartOffset::Newest)
            .await
            .unwrap();
        let hook = CreationEventPublisher::new(broker.clone(), target());

        hook.resource_created("user@example.com").await;

        let event = sub.next_event().await.unwrap();
        assert_eq!(event.payload_str(), "user@example.com");
    }

    #[tokio::test]
    async fn close_releases_publisher() {
        let broker = Arc::new(InMemoryBroker::new());
        let hook = CreationEventPublisher::new(broker.clone(), target());

        hook.close().await;
        hook.close().await;

        assert!(broker.is_closed());
        hook.resource_created("late@example.com").await;
        assert!(broker.published(&target()).is_empty());
    }
}
