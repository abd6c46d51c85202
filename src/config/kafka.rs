//! Kafka broker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Kafka broker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// Comma-separated bootstrap brokers
    #[serde(default = "default_brokers")]
    pub brokers: String,

    /// Topic carrying registration events
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Partition both sides use
    #[serde(default)]
    pub partition: i32,

    /// Consumer group id (required by librdkafka, offsets are never committed)
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// How long a publish may wait for acknowledgement, in milliseconds
    #[serde(default = "default_message_timeout")]
    pub message_timeout_ms: u64,

    /// Consumer session timeout, in milliseconds
    #[serde(default = "default_session_timeout")]
    pub session_timeout_ms: u64,
}

impl KafkaConfig {
    /// Get publish acknowledgement timeout as Duration
    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }

    /// Validate Kafka configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.brokers.trim().is_empty() {
            return Err(ValidationError::MissingRequired("KAFKA__BROKERS"));
        }
        if self.topic.trim().is_empty() {
            return Err(ValidationError::MissingRequired("KAFKA__TOPIC"));
        }
        if self.group_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("KAFKA__GROUP_ID"));
        }
        if self.partition < 0 {
            return Err(ValidationError::NegativePartition);
        }
        if self.message_timeout_ms == 0 || self.message_timeout_ms > 300_000 {
            return Err(ValidationError::InvalidKafkaTimeout("message_timeout_ms"));
        }
        if !(1_000..=300_000).contains(&self.session_timeout_ms) {
            return Err(ValidationError::InvalidKafkaTimeout("session_timeout_ms"));
        }
        Ok(())
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            topic: default_topic(),
            partition: 0,
            group_id: default_group_id(),
            message_timeout_ms: default_message_timeout(),
            session_timeout_ms: default_session_timeout(),
        }
    }
}

fn default_brokers() -> String {
    "kafka:9092".to_string()
}

fn default_topic() -> String {
    "registration-topic".to_string()
}

fn default_group_id() -> String {
    "courier-notifier".to_string()
}

fn default_message_timeout() -> u64 {
    5_000
}

fn default_session_timeout() -> u64 {
    30_000
}
