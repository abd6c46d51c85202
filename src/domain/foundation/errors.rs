//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value construction and state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidStateTransition,

    // Relay errors
    TransportError,

    // Broker errors
    BrokerConnection,
    DeliveryFailed,
    SubscriptionFailed,

    // Downstream errors
    NotificationFailed,

    // Infrastructure errors
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::TransportError => "TRANSPORT_ERROR",
            ErrorCode::BrokerConnection => "BROKER_CONNECTION",
            ErrorCode::DeliveryFailed => "DELIVERY_FAILED",
            ErrorCode::SubscriptionFailed => "SUBSCRIPTION_FAILED",
            ErrorCode::NotificationFailed => "NOTIFICATION_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Broker could not be reached or the client could not be created.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BrokerConnection, message)
    }

    /// Broker rejected the message or the send was not acknowledged.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeliveryFailed, message)
    }

    /// Partition subscription could not be established.
    pub fn subscription(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SubscriptionFailed, message)
    }

    /// Notification action reported failure.
    pub fn notification(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotificationFailed, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let code = match &err {
            ValidationError::InvalidFormat { field, .. } if field == "state_transition" => {
                ErrorCode::InvalidStateTransition
            }
            _ => ErrorCode::ValidationFailed,
        };
        DomainError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("topic");
        assert_eq!(format!("{}", err), "Field 'topic' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("partition", 0, i32::MAX as i64, -1);
        assert_eq!(
            format!("{}", err),
            "Field 'partition' must be between 0 and 2147483647, got -1"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::delivery("broker rejected message");
        assert_eq!(format!("{}", err), "[DELIVERY_FAILED] broker rejected message");
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::connection("unreachable")
            .with_detail("brokers", "kafka:9092")
            .with_detail("attempt", "1");

        assert_eq!(err.details.get("brokers"), Some(&"kafka:9092".to_string()));
        assert_eq!(err.details.get("attempt"), Some(&"1".to_string()));
    }

    #[test]
    fn state_transition_validation_maps_to_transition_code() {
        let err: DomainError =
            ValidationError::invalid_format("state_transition", "Closed -> Open").into();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);

        let err: DomainError = ValidationError::empty_field("topic").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn error_code_display_formats_correctly() {
        assert_eq!(format!("{}", ErrorCode::BrokerConnection), "BROKER_CONNECTION");
        assert_eq!(format!("{}", ErrorCode::InternalError), "INTERNAL_ERROR");
    }
}
