// User-facing notifications (fire-and-forget)

use crate::models::{Notification, Severity};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Notifier delivers a message to whoever presents it to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => info!(title = %notification.title, "{}", notification.message),
            Severity::Error => warn!(title = %notification.title, "{}", notification.message),
        }
    }
}

/// Forwards notifications to a channel, e.g. the console's output task
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<Notification>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            warn!(message = %e.0.message, "Notification dropped, receiver closed");
        }
    }
}
