//! Process shutdown signalling.
//!
//! Both binaries fan one OS signal out to every long-running loop through a
//! `watch` channel carrying `true` once shutdown has begun.

use tokio::sync::watch;
use tracing::{info, warn};

/// Sender half owned by the process entry point.
pub type ShutdownSender = watch::Sender<bool>;

/// Receiver half cloned into every loop that must stop on shutdown.
pub type ShutdownReceiver = watch::Receiver<bool>;

/// Create a shutdown channel in the "running" state.
pub fn channel() -> (ShutdownSender, ShutdownReceiver) {
    watch::channel(false)
}

/// Resolve once shutdown has been requested.
///
/// Returns immediately if it already was. If every sender is dropped without
/// signalling, this never resolves: a vanished owner is not a shutdown.
pub async fn requested(rx: &mut ShutdownReceiver) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Wait for SIGINT or SIGTERM.
pub async fn os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, listening for SIGINT only");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl-C");
    }
}

/// Spawn a task that flips `tx` to `true` on the first OS signal.
pub fn spawn_signal_listener(tx: ShutdownSender) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        os_signal().await;
        // Receivers may all be gone already; nothing left to notify.
        let _ = tx.send(true);
    })
}
