//! Broker events and delivery receipts.

use std::borrow::Cow;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// A named topic and one of its partitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

impl TopicPartition {
    /// Creates a validated topic/partition pair.
    ///
    /// Topic names must be non-empty and partitions non-negative.
    pub fn new(topic: impl Into<String>, partition: i32) -> Result<Self, ValidationError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(ValidationError::empty_field("topic"));
        }
        if partition < 0 {
            return Err(ValidationError::out_of_range(
                "partition",
                0,
                i32::MAX as i64,
                partition as i64,
            ));
        }
        Ok(Self { topic, partition })
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.partition)
    }
}

/// Where a new subscription begins reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartOffset {
    /// Only events published after the subscription is established.
    #[default]
    Newest,
    /// Every event still retained by the broker.
    Oldest,
}

/// An opaque payload received from a topic partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

impl Event {
    /// Payload interpreted as text; invalid UTF-8 is replaced, not rejected.
    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Where the broker placed a published event. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition {} offset {}", self.partition, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_partition_rejects_empty_topic() {
        assert!(matches!(
            TopicPartition::new("  ", 0),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn topic_partition_rejects_negative_partition() {
        assert!(matches!(
            TopicPartition::new("registration-topic", -1),
            Err(ValidationError::OutOfRange { actual: -1, .. })
        ));
    }

    #[test]
    fn topic_partition_displays_slash_form() {
        let tp = TopicPartition::new("registration-topic", 0).unwrap();
        assert_eq!(tp.to_string(), "registration-topic/0");
    }

    #[test]
    fn start_offset_defaults_to_newest() {
        assert_eq!(StartOffset::default(), StartOffset::Newest);
    }

    #[test]
    fn payload_str_is_lossy() {
        let event = Event {
            topic: "t".into(),
            partition: 0,
            offset: 3,
            payload: vec![b'h', b'i', 0xff],
        };
        assert_eq!(event.payload_str(), "hi\u{fffd}");
    }
}
