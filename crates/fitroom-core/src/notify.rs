//! User-visible notifications (toasts). Fire-and-forget: the core never waits on a sink.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress notice while work is pending.
    Info,
    Success,
    Error,
}

/// A transient message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self { severity: Severity::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { severity: Severity::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, message: message.into() }
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Error => tracing::warn!(target: "fitroom::notify", "{}", n.message),
            Severity::Info | Severity::Success => {
                tracing::info!(target: "fitroom::notify", severity = ?n.severity, "{}", n.message)
            }
        }
    }
}

/// Broadcasts notifications to every subscriber (e.g. one per open view).
///
/// Messages sent while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        tracing::trace!(target: "fitroom::notify", message = %notification.message, "broadcast");
        // No receivers is fine.
        let _ = self.tx.send(notification);
    }
}

/// Drains every notification currently buffered in `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(n) => out.push(n),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_fans_out_to_subscribers() {
        let notifier = ChannelNotifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.notify(Notification::success("saved"));
        notifier.notify(Notification::error("boom"));

        let got = drain(&mut a);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], Notification::success("saved"));
        assert_eq!(got[1].severity, Severity::Error);
        assert_eq!(drain(&mut b).len(), 2);
    }

    #[test]
    fn send_without_subscribers_is_silent() {
        let notifier = ChannelNotifier::with_capacity(1);
        notifier.notify(Notification::info("nobody listening"));
        let mut late = notifier.subscribe();
        assert!(drain(&mut late).is_empty());
    }
}
