//! Notification action that records the delivery in the service log.
//!
//! Stands in for a mail or push provider: the recipient identifier is
//! validated and the send is logged.

use async_trait::async_trait;
use tracing::info;

use crate::domain::foundation::DomainError;
use crate::ports::NotificationAction;

/// Logs one line per notification.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationAction for LogNotifier {
    async fn notify(&self, recipient: &str) -> Result<(), DomainError> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(DomainError::notification("recipient is empty"));
        }

        info!(recipient, "Send notification to user");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogNotifier"
    }
}
