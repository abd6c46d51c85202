//! Notification action adapters.

mod log_notifier;

pub use log_notifier::LogNotifier;
