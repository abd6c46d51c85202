//! Notification consumer configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Notification consumer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerConfig {
    /// Maximum notification tasks running at once
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl ConsumerConfig {
    /// Validate consumer configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_in_flight == 0 || self.max_in_flight > 10_000 {
            return Err(ValidationError::InvalidInFlightLimit);
        }
        Ok(())
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_max_in_flight() -> usize {
    64
}
