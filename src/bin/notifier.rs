//! courier-notifier - Consumes registration events and notifies each recipient.
//!
//! Subscribes to the configured partition from the newest offset. On
//! SIGINT/SIGTERM it stops taking events, waits up to the shutdown timeout for
//! in-flight notifications, then releases the broker client.

use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use courier::adapters::events::KafkaEventSource;
use courier::adapters::notification::LogNotifier;
use courier::application::NotificationConsumer;
use courier::config::{AppConfig, ServerConfig};
use courier::domain::events::TopicPartition;
use courier::ports::EventSource;
use courier::shutdown;
use courier::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load_validated() {
        Ok(config) => config,
        Err(e) => {
            let _ = telemetry::init_tracing(&ServerConfig::default());
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = telemetry::init_tracing(&config.server) {
        eprintln!("Failed to install tracing subscriber: {e}");
    }

    let target = match TopicPartition::new(config.kafka.topic.clone(), config.kafka.partition) {
        Ok(target) => target,
        Err(e) => {
            error!(error = %e, "Invalid topic partition");
            return ExitCode::FAILURE;
        }
    };

    info!(brokers = %config.kafka.brokers, partition = %target, "Connecting to Kafka");
    let source = match KafkaEventSource::connect(&config.kafka).await {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!(error = %e, "Failed to create Kafka consumer");
            return ExitCode::FAILURE;
        }
    };

    let consumer = NotificationConsumer::new(source.clone(), Arc::new(LogNotifier::new()), target)
        .with_max_in_flight(config.consumer.max_in_flight);

    let (tx, rx) = shutdown::channel();
    let mut stop = rx.clone();
    shutdown::spawn_signal_listener(tx);

    let cancel = CancellationToken::new();
    let _cancel_on_exit = cancel.clone().drop_guard();
    let mut running = tokio::spawn(consumer.run(rx, cancel.clone()));

    let joined = tokio::select! {
        joined = &mut running => Ok(joined),
        _ = shutdown::requested(&mut stop) => {
            info!(timeout = ?config.server.shutdown_timeout(), "Draining notifications");
            tokio::time::timeout(config.server.shutdown_timeout(), running).await
        }
    };

    EventSource::close(source.as_ref()).await;

    match joined {
        Ok(Ok(report)) => {
            info!(
                cause = ?report.cause,
                dispatched = report.dispatched,
                succeeded = report.succeeded,
                failed = report.failed,
                lost = report.lost(),
                "Notifier stopped"
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!(error = %e, "Consumer task failed");
            ExitCode::FAILURE
        }
        Err(_) => {
            warn!("Drain timed out, abandoning in-flight notifications");
            ExitCode::FAILURE
        }
    }
}
