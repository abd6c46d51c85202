//! Kafka implementation of the `EventSource` port.
//!
//! Subscriptions are partition assignments, not group subscriptions: the
//! consumer reads exactly one partition from the requested start offset and
//! never commits offsets.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::util::Timeout;
use rdkafka::{Message, Offset, TopicPartitionList};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::KafkaConfig;
use crate::domain::events::{Event, StartOffset, TopicPartition};
use crate::domain::foundation::DomainError;
use crate::ports::{EventSource, Subscription};

/// Pause after a transient receive error before polling again.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(200);

/// Kafka event source backed by a single `StreamConsumer`.
///
/// Configured for:
/// - `enable.auto.commit=false`: no offset persistence beyond the start cursor
/// - `enable.partition.eof=false`: reaching the log end is not an event
pub struct KafkaEventSource {
    consumer: Arc<StreamConsumer>,
}

impl KafkaEventSource {
    /// Create the consumer client and confirm the broker is reachable.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::BrokerConnection` if the client cannot be created
    /// or cluster metadata cannot be fetched.
    pub async fn connect(config: &KafkaConfig) -> Result<Self, DomainError> {
        info!(brokers = %config.brokers, group_id = %config.group_id, "Connecting Kafka consumer");

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", config.session_timeout_ms.to_string())
            .create()
            .map_err(|e| {
                DomainError::connection(format!("Failed to create Kafka consumer: {}", e))
                    .with_detail("brokers", config.brokers.clone())
            })?;
        let consumer = Arc::new(consumer);

        let client = Arc::clone(&consumer);
        let topic = config.topic.clone();
        let timeout = config.message_timeout();
        let checked = tokio::task::spawn_blocking(move || {
            client
                .fetch_metadata(Some(topic.as_str()), Timeout::After(timeout))
                .map(|_| ())
        })
        .await;

        match checked {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(DomainError::connection(format!("Kafka broker unreachable: {}", e))
                    .with_detail("brokers", config.brokers.clone()))
            }
            Err(e) => {
                return Err(DomainError::connection(format!(
                    "Kafka metadata check aborted: {}",
                    e
                )))
            }
        }

        info!("Kafka consumer connected");
        Ok(Self { consumer })
    }
}

fn kafka_offset(start: StartOffset) -> Offset {
    match start {
        StartOffset::Newest => Offset::End,
        StartOffset::Oldest => Offset::Beginning,
    }
}

#[async_trait]
impl EventSource for KafkaEventSource {
    async fn subscribe(
        &self,
        target: &TopicPartition,
        start: StartOffset,
    ) -> Result<Box<dyn Subscription>, DomainError> {
        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(&target.topic, target.partition, kafka_offset(start))
            .map_err(|e| subscription_error(target, e))?;
        self.consumer
            .assign(&assignment)
            .map_err(|e| subscription_error(target, e))?;

        info!(topic = %target.topic, partition = target.partition, ?start, "Partition assigned");

        Ok(Box::new(KafkaSubscription {
            consumer: Arc::clone(&self.consumer),
            target: target.clone(),
            finished: false,
        }))
    }

    async fn close(&self) {
        // librdkafka leaves the group and closes sockets when the last
        // handle drops; only the assignment needs explicit release here.
        if let Err(e) = self.consumer.unassign() {
            warn!(error = %e, "Fail consumer close");
        } else {
            info!("Kafka consumer closed");
        }
    }
}

fn subscription_error(target: &TopicPartition, e: KafkaError) -> DomainError {
    DomainError::subscription(format!("Fail partition consumer: {}", e))
        .with_detail("partition", target.to_string())
}

/// One assigned partition.
pub struct KafkaSubscription {
    consumer: Arc<StreamConsumer>,
    target: TopicPartition,
    finished: bool,
}

#[async_trait]
impl Subscription for KafkaSubscription {
    async fn next_event(&mut self) -> Option<Event> {
        while !self.finished {
            match self.consumer.recv().await {
                Ok(message) => {
                    return Some(Event {
                        topic: message.topic().to_string(),
                        partition: message.partition(),
                        offset: message.offset(),
                        payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                    });
                }
                Err(e) if is_terminal(&e) => {
                    warn!(partition = %self.target, error = %e, "Kafka subscription terminated");
                    self.finished = true;
                }
                Err(e) => {
                    warn!(partition = %self.target, error = %e, "Kafka receive error");
                    tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await;
                }
            }
        }
        None
    }

    async fn close(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(e) = self.consumer.unassign() {
            warn!(partition = %self.target, error = %e, "Fail partition consumer close");
        }
    }
}

fn is_terminal(e: &KafkaError) -> bool {
    matches!(
        e.rdkafka_error_code(),
        Some(RDKafkaErrorCode::Fatal)
            | Some(RDKafkaErrorCode::UnknownTopicOrPartition)
            | Some(RDKafkaErrorCode::UnknownPartition)
            | Some(RDKafkaErrorCode::TopicAuthorizationFailed)
    )
}
