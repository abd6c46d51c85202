//! Kafka implementation of the `EventPublisher` port.
//!
//! One long-lived `FutureProducer` is opened at process startup and reused
//! for every creation event. Each `publish` emits exactly one record to an
//! explicit partition and waits for the broker acknowledgement.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::KafkaConfig;
use crate::domain::events::{Delivery, TopicPartition};
use crate::domain::foundation::DomainError;
use crate::ports::EventPublisher;

/// Kafka event publisher.
///
/// Configured for:
/// - `acks=all`: the broker acknowledges only after in-sync replicas have it
/// - `retries=0`: a failed send is reported, never retried
/// - `linger.ms=0`: no batching window
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    ack_timeout: Duration,
    closed: AtomicBool,
}

impl KafkaEventPublisher {
    /// Open a producer and confirm the broker is reachable.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::BrokerConnection` if the client cannot be created
    /// or cluster metadata cannot be fetched within the message timeout.
    pub async fn open(config: &KafkaConfig) -> Result<Self, DomainError> {
        info!(brokers = %config.brokers, "Opening Kafka producer");

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("acks", "all")
            .set("retries", "0")
            .set("linger.ms", "0")
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .create()
            .map_err(|e| {
                DomainError::connection(format!("Failed to create Kafka producer: {}", e))
                    .with_detail("brokers", config.brokers.clone())
            })?;

        check_metadata(&producer, &config.topic, config.message_timeout())
            .await
            .map_err(|e| e.with_detail("brokers", config.brokers.clone()))?;

        info!("Kafka producer ready");

        Ok(Self {
            producer,
            ack_timeout: config.message_timeout(),
            closed: AtomicBool::new(false),
        })
    }
}

/// Fetch topic metadata on a blocking thread; librdkafka's call blocks.
async fn check_metadata(
    producer: &FutureProducer,
    topic: &str,
    timeout: Duration,
) -> Result<(), DomainError> {
    let producer = producer.clone();
    let topic = topic.to_string();
    let result = tokio::task::spawn_blocking(move || {
        producer
            .client()
            .fetch_metadata(Some(topic.as_str()), Timeout::After(timeout))
            .map(|_| ())
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(DomainError::connection(format!(
            "Kafka broker unreachable: {}",
            e
        ))),
        Err(e) => Err(DomainError::connection(format!(
            "Kafka metadata check aborted: {}",
            e
        ))),
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(
        &self,
        target: &TopicPartition,
        payload: &[u8],
    ) -> Result<Delivery, DomainError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DomainError::connection("Kafka producer is closed"));
        }

        let record: FutureRecord<'_, (), [u8]> = FutureRecord::to(&target.topic)
            .partition(target.partition)
            .payload(payload);

        match self
            .producer
            .send(record, Timeout::After(self.ack_timeout))
            .await
        {
            Ok((partition, offset)) => {
                debug!(topic = %target.topic, partition, offset, "Kafka acknowledged record");
                Ok(Delivery { partition, offset })
            }
            Err((kafka_err, _)) => Err(DomainError::delivery(format!(
                "Kafka send failed: {}",
                kafka_err
            ))
            .with_detail("topic", target.topic.clone())
            .with_detail("partition", target.partition.to_string())),
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let producer = self.producer.clone();
        let timeout = self.ack_timeout;
        match tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout))).await {
            Ok(Ok(())) => info!("Kafka producer closed"),
            Ok(Err(e)) => warn!(error = %e, "Fail producer close"),
            Err(e) => warn!(error = %e, "Kafka producer flush aborted"),
        }
    }
}
