//! Event pipeline domain module.
//!
//! Opaque events exchanged with the broker, delivery receipts returned by
//! the publisher, and the consumer lifecycle.

mod consumer_state;
mod event;

pub use consumer_state::{ConsumerState, DrainReport, StopCause};
pub use event::{Delivery, Event, StartOffset, TopicPartition};
