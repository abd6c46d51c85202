//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `COURIER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use courier::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Relay listening on {:?}", config.server.socket_addr());
//! ```

mod consumer;
mod error;
mod kafka;
mod relay;
mod server;

pub use consumer::ConsumerConfig;
pub use error::{ConfigError, ValidationError};
pub use kafka::KafkaConfig;
pub use relay::RelayConfig;
pub use server::{LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// local configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Bind address, logging, shutdown timeout
    #[serde(default)]
    pub server: ServerConfig,

    /// Duplex relay settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// Broker location and topic
    #[serde(default)]
    pub kafka: KafkaConfig,

    /// Notification fan-out limits
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `COURIER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `COURIER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `COURIER__KAFKA__BROKERS=kafka:9092` -> `kafka.brokers = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COURIER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step, as both binaries do at startup.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.relay.validate()?;
        self.kafka.validate()?;
        self.consumer.validate()?;
        Ok(())
    }
}
