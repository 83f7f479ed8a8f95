//! Driven port for transient user notifications (toasts).
//!
//! Notifications are fire-and-forget: the domain never waits for the user to
//! see them and never stores them as persistent error state.

use std::fmt;

/// How prominently a notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational confirmation.
    Info,
    /// A change did not persist and was reverted.
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    severity: Severity,
    subject: String,
    message: String,
}

impl Notification {
    /// Build a notification about `subject`.
    pub fn new(severity: Severity, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Report that `action` on `subject` did not persist and was reverted.
    ///
    /// # Examples
    /// ```
    /// use wild_robot::domain::ports::{Notification, Severity};
    ///
    /// let note = Notification::mutation_failed("attendance update", 2, "timeout");
    /// assert_eq!(note.severity(), Severity::Error);
    /// assert_eq!(note.subject(), "2");
    /// assert_eq!(note.message(), "attendance update for 2 was not saved: timeout");
    /// ```
    pub fn mutation_failed(
        action: &str,
        subject: impl fmt::Display,
        cause: impl fmt::Display,
    ) -> Self {
        Self::new(
            Severity::Error,
            subject.to_string(),
            format!("{action} for {subject} was not saved: {cause}"),
        )
    }

    /// Severity of the notification.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Identifier of the record the notification is about.
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Text shown to the user.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Sink for transient notifications.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Show `notification` once.
    fn notify(&self, notification: Notification);
}
