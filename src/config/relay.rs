//! Relay configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Duplex relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Upgrade path
    #[serde(default = "default_path")]
    pub path: String,

    /// Transport write buffer in bytes
    #[serde(default = "default_buffer_size")]
    pub write_buffer_size: usize,

    /// Frames buffered between the read task and the dispatch loop
    #[serde(default = "default_handoff_capacity")]
    pub handoff_capacity: usize,

    /// Echoes buffered ahead of the writer before reads wait
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

impl RelayConfig {
    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.path.starts_with('/') {
            return Err(ValidationError::InvalidRelayPath);
        }
        if self.write_buffer_size == 0 {
            return Err(ValidationError::ZeroCapacity("write_buffer_size"));
        }
        if self.handoff_capacity == 0 {
            return Err(ValidationError::ZeroCapacity("handoff_capacity"));
        }
        if self.outbound_capacity == 0 {
            return Err(ValidationError::ZeroCapacity("outbound_capacity"));
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            write_buffer_size: default_buffer_size(),
            handoff_capacity: default_handoff_capacity(),
            outbound_capacity: default_outbound_capacity(),
        }
    }
}

fn default_path() -> String {
    "/ws".to_string()
}

fn default_buffer_size() -> usize {
    1024
}

fn default_handoff_capacity() -> usize {
    64
}

fn default_outbound_capacity() -> usize {
    256
}
