//! Collaborator ports at both ends of the event pipeline.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Downstream side effect triggered once per consumed event.
///
/// The payload is the recipient identifier carried by the event.
/// Implementations should be:
/// - **Independent** - No state shared with other in-flight notifications
/// - **Non-retrying** - The consumer logs failures and moves on
#[async_trait]
pub trait NotificationAction: Send + Sync {
    /// Deliver one notification.
    async fn notify(&self, recipient: &str) -> Result<(), DomainError>;

    /// Action name for logging.
    fn name(&self) -> &'static str;
}

/// Upstream call point invoked after a resource has been durably created.
///
/// Deliberately infallible: nothing that happens here can fail or roll back
/// the creation that triggered it.
#[async_trait]
pub trait ResourceCreatedHook: Send + Sync {
    /// Announce a created resource by its notification-relevant payload.
    async fn resource_created(&self, payload: &str);
}
