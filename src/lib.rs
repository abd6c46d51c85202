//! Courier - Duplex echo relay and partitioned event pipeline
//!
//! This crate implements two independent network services:
//! - a WebSocket relay that echoes every text and binary frame back to its sender
//! - a notification pipeline that turns resource-creation events published to a
//!   Kafka partition into per-recipient notifications

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod shutdown;
pub mod telemetry;
