//! Relay connection lifecycle.

use crate::domain::foundation::StateMachine;

/// Lifecycle of a single relay connection.
///
/// ```text
/// Open ──► Closing ──► Closed
/// ```
///
/// `Closing` is entered on the first close trigger; `Closed` once the
/// handler has released the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Open,
    Closing,
    Closed,
}

impl StateMachine for ConnectionState {
    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            ConnectionState::Open => vec![ConnectionState::Closing],
            ConnectionState::Closing => vec![ConnectionState::Closed],
            ConnectionState::Closed => vec![],
        }
    }
}

/// Why a connection left the `Open` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Client sent a close frame or the stream ended.
    ClientClosed,
    /// The transport failed while reading.
    ReadError(String),
    /// The process is shutting down.
    Shutdown,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::ClientClosed => write!(f, "client closed"),
            CloseReason::ReadError(e) => write!(f, "read error: {}", e),
            CloseReason::Shutdown => write!(f, "shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_open() {
        assert_eq!(ConnectionState::default(), ConnectionState::Open);
    }

    #[test]
    fn open_closes_through_closing() {
        let closing = ConnectionState::Open
            .transition_to(ConnectionState::Closing)
            .unwrap();
        let closed = closing.transition_to(ConnectionState::Closed).unwrap();
        assert!(closed.is_terminal());
        assert!(!closing.is_terminal());
    }

    #[test]
    fn cannot_skip_closing_or_reopen() {
        assert!(ConnectionState::Open
            .transition_to(ConnectionState::Closed)
            .is_err());
        assert!(ConnectionState::Closed
            .transition_to(ConnectionState::Open)
            .is_err());
        assert!(ConnectionState::Closing
            .transition_to(ConnectionState::Open)
            .is_err());
    }

    #[test]
    fn close_reason_display() {
        assert_eq!(
            CloseReason::ReadError("connection reset".into()).to_string(),
            "read error: connection reset"
        );
        assert_eq!(CloseReason::ClientClosed.to_string(), "client closed");
        assert_eq!(CloseReason::Shutdown.to_string(), "shutdown");
    }
}
