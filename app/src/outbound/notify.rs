//! Notifier adapters.
//!
//! [`TracingNotifier`] records failed mutations in the structured log, which
//! suits headless clients and tests. [`ChannelNotifier`] forwards each
//! notification to a UI task that renders toasts.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::domain::ports::{Notification, Notifier, Severity};

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity() {
            Severity::Error => warn!(
                subject = notification.subject(),
                message = notification.message(),
                "change reverted"
            ),
            Severity::Info => info!(
                subject = notification.subject(),
                message = notification.message(),
                "notification"
            ),
        }
    }
}

/// Forwards notifications to a receiving UI task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Forward notifications to the receiver paired with `sender`.
    pub fn new(sender: UnboundedSender<Notification>) -> Self {
        Self { sender }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // A closed receiver means the UI has gone away; the log keeps the
        // failure visible.
        if let Err(err) = self.sender.send(notification) {
            TracingNotifier.notify(err.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::sync::mpsc;

    #[rstest]
    fn channel_notifier_forwards_in_order() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let notifier = ChannelNotifier::new(sender);

        notifier.notify(Notification::mutation_failed("attendance update", 2, "timeout"));
        notifier.notify(Notification::new(Severity::Info, "roster", "reloaded"));

        let first = receiver.try_recv().expect("first notification");
        assert_eq!(first.subject(), "2");
        assert_eq!(first.severity(), Severity::Error);
        let second = receiver.try_recv().expect("second notification");
        assert_eq!(second.message(), "reloaded");
        assert!(receiver.try_recv().is_err());
    }

    #[rstest]
    fn closed_channel_does_not_panic() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);

        ChannelNotifier::new(sender).notify(Notification::mutation_failed(
            "attendance update",
            3,
            "offline",
        ));
    }

    #[rstest]
    fn tracing_notifier_accepts_every_severity() {
        TracingNotifier.notify(Notification::new(Severity::Info, "roster", "reloaded"));
        TracingNotifier.notify(Notification::mutation_failed("attendance update", 1, "denied"));
    }
}
