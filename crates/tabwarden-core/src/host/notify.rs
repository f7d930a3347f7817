use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// Fire-and-forget user notifications. Delivery is not acknowledged.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str, priority: Priority);
}

/// Drops every notification; used when notifications are disabled in config.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, title: &str, _message: &str, _priority: Priority) {
        tracing::debug!(title, "notification suppressed");
    }
}
