//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid shutdown timeout")]
    InvalidTimeout,

    #[error("Relay path must start with '/'")]
    InvalidRelayPath,

    #[error("Buffer and queue sizes must be non-zero: {0}")]
    ZeroCapacity(&'static str),

    #[error("Kafka partition must be non-negative")]
    NegativePartition,

    #[error("Kafka timeout out of range: {0}")]
    InvalidKafkaTimeout(&'static str),

    #[error("max_in_flight must be between 1 and 10000")]
    InvalidInFlightLimit,
}
