//! Event consumer lifecycle.

use crate::domain::foundation::StateMachine;

/// Lifecycle of the notification consumer.
///
/// ```text
/// Initializing ──► Subscribed ──► Draining ──► Stopped
///       │                            ▲
///       └────────────────────────────┘
/// ```
///
/// `Initializing` may go straight to `Draining` when shutdown arrives
/// before a subscription is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsumerState {
    #[default]
    Initializing,
    Subscribed,
    Draining,
    Stopped,
}

impl StateMachine for ConsumerState {
    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            ConsumerState::Initializing => {
                vec![ConsumerState::Subscribed, ConsumerState::Draining]
            }
            ConsumerState::Subscribed => vec![ConsumerState::Draining],
            ConsumerState::Draining => vec![ConsumerState::Stopped],
            ConsumerState::Stopped => vec![],
        }
    }
}

/// Why the dispatch loop stopped taking new events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// Broker side closed the subscription.
    SubscriptionClosed,
    /// External shutdown signal (SIGINT/SIGTERM).
    Shutdown,
    /// Owner cancelled the consumer.
    Cancelled,
}

/// Counters reported once the consumer reaches `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub cause: StopCause,
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl DrainReport {
    pub(crate) fn new(cause: StopCause) -> Self {
        Self {
            cause,
            dispatched: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    /// Tasks whose outcome is unknown (panicked or aborted).
    pub fn lost(&self) -> u64 {
        self.dispatched.saturating_sub(self.succeeded + self.failed)
    }
}
