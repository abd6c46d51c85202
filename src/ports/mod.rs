//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the pipeline and the outside world. Adapters implement these ports.
//!
//! ## Broker Ports
//!
//! - `EventPublisher` - Emit one event to a topic partition
//! - `EventSource` - Open partition subscriptions
//! - `Subscription` - Receive events from one partition
//!
//! ## Collaborator Ports
//!
//! - `ResourceCreatedHook` - Upstream call point in the creation path
//! - `NotificationAction` - Downstream side effect per consumed event

mod event_publisher;
mod event_source;
mod notification_action;

pub use event_publisher::EventPublisher;
pub use event_source::{EventSource, Subscription};
pub use notification_action::{NotificationAction, ResourceCreatedHook};
