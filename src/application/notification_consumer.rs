//! NotificationConsumer - Dispatch loop from one partition to a notification action.
//!
//! The loop:
//! 1. Subscribes to the partition from the newest offset
//! 2. Spawns one notification task per received event
//! 3. Stops taking events on shutdown, cancellation, or subscription closure
//! 4. Waits for every spawned task before reporting

use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::events::{ConsumerState, DrainReport, Event, StartOffset, StopCause, TopicPartition};
use crate::domain::foundation::StateMachine;
use crate::ports::{EventSource, NotificationAction, Subscription};
use crate::shutdown::{self, ShutdownReceiver};

/// Default bound on concurrently running notification tasks.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Consumes one topic partition and notifies the recipient of every event.
pub struct NotificationConsumer {
    source: Arc<dyn EventSource>,
    action: Arc<dyn NotificationAction>,
    target: TopicPartition,
    max_in_flight: usize,
}

impl NotificationConsumer {
    pub fn new(
        source: Arc<dyn EventSource>,
        action: Arc<dyn NotificationAction>,
        target: TopicPartition,
    ) -> Self {
        Self {
            source,
            action,
            target,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Bound the number of notification tasks running at once (minimum 1).
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Run until shutdown, cancellation, or subscription closure, then drain.
    ///
    /// Returns once every spawned notification task has finished. If the
    /// subscription cannot be established the failure is logged and the
    /// consumer idles until shutdown or cancellation.
    pub async fn run(self, mut shutdown: ShutdownReceiver, cancel: CancellationToken) -> DrainReport {
        let mut state = ConsumerState::Initializing;
        let mut tally = Tally::default();
        let mut tasks: JoinSet<bool> = JoinSet::new();

        let cause = match self.establish(&mut shutdown, &cancel).await {
            Ok(mut subscription) => {
                advance(&mut state, ConsumerState::Subscribed);
                let cause = self
                    .dispatch_loop(subscription.as_mut(), &mut tasks, &mut tally, &mut shutdown, &cancel)
                    .await;
                advance(&mut state, ConsumerState::Draining);
                subscription.close().await;
                cause
            }
            Err(cause) => {
                advance(&mut state, ConsumerState::Draining);
                cause
            }
        };

        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "Waiting for in-flight notifications");
        }
        while let Some(joined) = tasks.join_next().await {
            tally.record(joined);
        }
        advance(&mut state, ConsumerState::Stopped);

        let report = tally.into_report(cause);
        info!(
            cause = ?report.cause,
            dispatched = report.dispatched,
            succeeded = report.succeeded,
            failed = report.failed,
            "Consumer stopped"
        );
        report
    }

    async fn establish(
        &self,
        shutdown: &mut ShutdownReceiver,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn Subscription>, StopCause> {
        let attempt = tokio::select! {
            biased;
            _ = shutdown::requested(shutdown) => return Err(StopCause::Shutdown),
            _ = cancel.cancelled() => return Err(StopCause::Cancelled),
            attempt = self.source.subscribe(&self.target, StartOffset::Newest) => attempt,
        };

        match attempt {
            Ok(subscription) => {
                info!(topic = %self.target.topic, partition = self.target.partition, "Subscribed");
                Ok(subscription)
            }
            Err(e) => {
                error!(
                    topic = %self.target.topic,
                    partition = self.target.partition,
                    error = %e,
                    "Error establishing subscription"
                );
                Err(stop_requested(shutdown, cancel).await)
            }
        }
    }

    async fn dispatch_loop(
        &self,
        subscription: &mut dyn Subscription,
        tasks: &mut JoinSet<bool>,
        tally: &mut Tally,
        shutdown: &mut ShutdownReceiver,
        cancel: &CancellationToken,
    ) -> StopCause {
        loop {
            tokio::select! {
                biased;
                _ = shutdown::requested(shutdown) => return StopCause::Shutdown,
                _ = cancel.cancelled() => return StopCause::Cancelled,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => tally.record(joined),
                next = subscription.next_event(), if tasks.len() < self.max_in_flight => match next {
                    Some(event) => {
                        self.dispatch(tasks, event);
                        tally.dispatched += 1;
                    }
                    None => {
                        warn!(
                            topic = %self.target.topic,
                            partition = self.target.partition,
                            "Subscription closed"
                        );
                        return StopCause::SubscriptionClosed;
                    }
                },
            }
        }
    }

    fn dispatch(&self, tasks: &mut JoinSet<bool>, event: Event) {
        let action = Arc::clone(&self.action);
        debug!(topic = %event.topic, partition = event.partition, offset = event.offset, "Event received");

        tasks.spawn(async move {
            let recipient = event.payload_str().into_owned();
            match action.notify(&recipient).await {
                Ok(()) => true,
                Err(e) => {
                    error!(
                        action = action.name(),
                        offset = event.offset,
                        error = %e,
                        "Error notifying user"
                    );
                    false
                }
            }
        });
    }
}

async fn stop_requested(shutdown: &mut ShutdownReceiver, cancel: &CancellationToken) -> StopCause {
    tokio::select! {
        biased;
        _ = shutdown::requested(shutdown) => StopCause::Shutdown,
        _ = cancel.cancelled() => StopCause::Cancelled,
    }
}

fn advance(state: &mut ConsumerState, next: ConsumerState) {
    match state.transition_to(next) {
        Ok(s) => *state = s,
        Err(e) => warn!(from = ?state, to = ?next, error = %e, "Ignored consumer state change"),
    }
}

#[derive(Default)]
struct Tally {
    dispatched: u64,
    succeeded: u64,
    failed: u64,
}

impl Tally {
    fn record(&mut self, joined: Result<bool, JoinError>) {
        match joined {
            Ok(true) => self.succeeded += 1,
            Ok(false) => self.failed += 1,
            Err(e) => warn!(error = %e, "Notification task did not complete"),
        }
    }

    fn into_report(self, cause: StopCause) -> DrainReport {
        let mut report = DrainReport::new(cause);
        report.dispatched = self.dispatched;
        report.succeeded = self.succeeded;
        report.failed = self.failed;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryBroker;
    use crate::domain::foundation::DomainError;
    use crate::ports::EventPublisher;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tokio::task::JoinHandle;

    fn target() -> TopicPartition {
        TopicPartition::new("registration-topic", 0).unwrap()
    }

    /// Records every recipient; fails for one configured recipient.
    #[derive(Default)]
    struct RecordingAction {
        seen: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl RecordingAction {
        fn failing_on(recipient: &str) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_on: Some(recipient.to_string()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationAction for RecordingAction {
        async fn notify(&self, recipient: &str) -> Result<(), DomainError> {
            self.seen.lock().unwrap().push(recipient.to_string());
            if self.fail_on.as_deref() == Some(recipient) {
                return Err(DomainError::notification("mailbox unavailable"));
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "RecordingAction"
        }
    }

    /// Blocks every notification until the test opens the gate.
    struct GatedAction {
        gate: Semaphore,
        started: AtomicUsize,
        active: AtomicUsize,
        peak: AtomicUsize,
        finished: AtomicUsize,
    }

    impl GatedAction {
        fn new() -> Self {
            Self {
                gate: Semaphore::new(0),
                started: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
            }
        }

        fn open(&self, n: usize) {
            self.gate.add_permits(n);
        }
    }

    #[async_trait]
    impl NotificationAction for GatedAction {
        async fn notify(&self, _recipient: &str) -> Result<(), DomainError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(active, Ordering::SeqCst);

            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| DomainError::notification("gate closed"))?;
            permit.forget();

            self.active.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "GatedAction"
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    struct Running {
        handle: JoinHandle<DrainReport>,
        shutdown: crate::shutdown::ShutdownSender,
        cancel: CancellationToken,
    }

    async fn start(
        broker: &Arc<InMemoryBroker>,
        action: Arc<dyn NotificationAction>,
        max_in_flight: usize,
    ) -> Running {
        let (shutdown, rx) = shutdown::channel();
        let cancel = CancellationToken::new();
        let consumer = NotificationConsumer::new(broker.clone(), action, target())
            .with_max_in_flight(max_in_flight);
        let handle = tokio::spawn(consumer.run(rx, cancel.clone()));
        Running {
            handle,
            shutdown,
            cancel,
        }
    }

    async fn start_subscribed(
        broker: &Arc<InMemoryBroker>,
        action: Arc<dyn NotificationAction>,
        max_in_flight: usize,
    ) -> Running {
        let running = start(broker, action, max_in_flight).await;
        wait_until(|| broker.subscriber_count(&target()) == 1).await;
        running
    }

    async fn finish(handle: JoinHandle<DrainReport>) -> DrainReport {
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("consumer did not stop")
            .unwrap()
    }

    #[tokio::test]
    async fn published_recipient_is_notified_exactly_once() {
        let broker = Arc::new(InMemoryBroker::new());
        let action = Arc::new(RecordingAction::default());
        let running = start_subscribed(&broker, action.clone(), 8).await;

        broker.publish(&target(), b"user@example.com").await.unwrap();
        wait_until(|| !action.seen().is_empty()).await;

        running.shutdown.send(true).unwrap();
        let report = finish(running.handle).await;

        assert_eq!(action.seen(), vec!["user@example.com".to_string()]);
        assert_eq!(report.cause, StopCause::Shutdown);
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.succeeded, 1);
    }

    #[tokio::test]
    async fn events_before_subscription_are_not_replayed() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.publish(&target(), b"early@example.com").await.unwrap();
        let action = Arc::new(RecordingAction::default());
        let running = start_subscribed(&broker, action.clone(), 8).await;

        broker.publish(&target(), b"late@example.com").await.unwrap();
        wait_until(|| !action.seen().is_empty()).await;
        running.shutdown.send(true).unwrap();
        finish(running.handle).await;

        assert_eq!(action.seen(), vec!["late@example.com".to_string()]);
    }

    #[tokio::test]
    async fn drain_waits_for_in_flight_notifications() {
        let broker = Arc::new(InMemoryBroker::new());
        let action = Arc::new(GatedAction::new());
        let running = start_subscribed(&broker, action.clone(), 8).await;

        for i in 0..3 {
            broker
                .publish(&target(), format!("user{i}@example.com").as_bytes())
                .await
                .unwrap();
        }
        wait_until(|| action.started.load(Ordering::SeqCst) == 3).await;

        running.shutdown.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!running.handle.is_finished());

        // Arrives after shutdown; must not be dispatched.
        broker.publish(&target(), b"after@example.com").await.unwrap();

        action.open(3);
        let report = finish(running.handle).await;

        assert_eq!(action.finished.load(Ordering::SeqCst), 3);
        assert_eq!(action.started.load(Ordering::SeqCst), 3);
        assert_eq!(report.dispatched, 3);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.lost(), 0);
    }

    #[tokio::test]
    async fn failing_notification_does_not_stop_loop() {
        let broker = Arc::new(InMemoryBroker::new());
        let action = Arc::new(RecordingAction::failing_on("bad@example.com"));
        let running = start_subscribed(&broker, action.clone(), 8).await;

        broker.publish(&target(), b"bad@example.com").await.unwrap();
        broker.publish(&target(), b"good@example.com").await.unwrap();
        wait_until(|| action.seen().len() == 2).await;

        running.shutdown.send(true).unwrap();
        let report = finish(running.handle).await;

        assert_eq!(report.dispatched, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn closed_subscription_stops_consumer() {
        let broker = Arc::new(InMemoryBroker::new());
        let action = Arc::new(RecordingAction::default());
        let running = start_subscribed(&broker, action, 8).await;

        broker.close_partition(&target());
        let report = finish(running.handle).await;

        assert_eq!(report.cause, StopCause::SubscriptionClosed);
        assert_eq!(report.dispatched, 0);
    }

    #[tokio::test]
    async fn subscribe_failure_idles_until_shutdown() {
        let broker = Arc::new(InMemoryBroker::new());
        EventSource::close(broker.as_ref()).await;
        let action = Arc::new(RecordingAction::default());
        let running = start(&broker, action, 8).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!running.handle.is_finished());

        running.shutdown.send(true).unwrap();
        let report = finish(running.handle).await;

        assert_eq!(report.cause, StopCause::Shutdown);
        assert_eq!(report.dispatched, 0);
    }

    #[tokio::test]
    async fn cancellation_stops_consumer() {
        let broker = Arc::new(InMemoryBroker::new());
        let action = Arc::new(RecordingAction::default());
        let running = start_subscribed(&broker, action, 8).await;

        running.cancel.cancel();
        let report = finish(running.handle).await;

        assert_eq!(report.cause, StopCause::Cancelled);
        assert_eq!(broker.subscriber_count(&target()), 0);
    }

    #[tokio::test]
    async fn in_flight_limit_bounds_concurrency() {
        let broker = Arc::new(InMemoryBroker::new());
        let action = Arc::new(GatedAction::new());
        let running = start_subscribed(&broker, action.clone(), 2).await;

        for i in 0..5 {
            broker
                .publish(&target(), format!("user{i}@example.com").as_bytes())
                .await
                .unwrap();
        }
        wait_until(|| action.started.load(Ordering::SeqCst) == 2).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(action.started.load(Ordering::SeqCst), 2);

        action.open(5);
        wait_until(|| action.finished.load(Ordering::SeqCst) == 5).await;
        running.shutdown.send(true).unwrap();
        let report = finish(running.handle).await;

        assert!(action.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(report.succeeded, 5);
    }

    #[test]
    fn zero_in_flight_limit_is_raised_to_one() {
        let broker = Arc::new(InMemoryBroker::new());
        let consumer = NotificationConsumer::new(
            broker,
            Arc::new(RecordingAction::default()),
            target(),
        )
        .with_max_in_flight(0);

        assert_eq!(consumer.max_in_flight, 1);
    }
}
