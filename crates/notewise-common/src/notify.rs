//! Transient, non-blocking user notifications (toast equivalents).
//!
//! Components push [`Notification`]s into a [`Notifier`]; the UI layer drains
//! them from a [`NotificationReceiver`] whenever it repaints.

use std::borrow::Cow;

use tokio::sync::mpsc;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: Cow<'static, str>,
}

impl Notification {
    pub fn success(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// User-facing messages.
pub mod messages {
    pub const QUIZ_GENERATED: &str = "Quiz generated successfully!";
    pub const QUIZ_FAILED: &str = "Failed to generate quiz.";
    pub const ATTEMPT_FAILED: &str = "Failed to save attempt.";
    pub const NOTE_LOAD_FAILED: &str = "Failed to load note";
    pub const NOTE_TITLE_MISSING: &str = "Please add a title";
    pub const NOTE_CREATED: &str = "Note created successfully!";
    pub const NOTE_UPDATED: &str = "Note updated successfully!";
    pub const NOTE_SAVE_FAILED: &str = "Failed to save note.";
    pub const SUMMARY_GENERATED: &str = "Summary generated successfully!";
    pub const SUMMARY_FAILED: &str = "Failed to generate summary. Please try again.";
    pub const PDF_FAILED: &str = "Failed to generate PDF.";
}

/// Sink for notifications.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Unit type implementation - notifications are dropped.
impl Notifier for () {
    fn notify(&self, _notification: Notification) {}
}

impl<T: Notifier> Notifier for &T {
    fn notify(&self, notification: Notification) {
        (*self).notify(notification)
    }
}

/// Create a connected sender/receiver pair.
pub fn channel() -> (NotificationSender, NotificationReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NotificationSender { tx }, NotificationReceiver { rx })
}

/// Cloneable sending half. Sending never blocks and never fails observably.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier for NotificationSender {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::trace!("notification receiver dropped");
        }
    }
}

#[derive(Debug)]
pub struct NotificationReceiver {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl NotificationReceiver {
    /// Take every notification queued so far without waiting.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.rx.try_recv() {
            out.push(n);
        }
        out
    }

    /// Wait for the next notification. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let (tx, mut rx) = channel();
        tx.notify(Notification::success(messages::QUIZ_GENERATED));
        tx.clone().notify(Notification::error(messages::ATTEMPT_FAILED));

        let drained = rx.drain();
        assert_eq!(drained.len(), 2);
        assert!(!drained[0].is_error());
        assert!(drained[1].is_error());
        assert_eq!(drained[1].message, messages::ATTEMPT_FAILED);
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = channel();
        drop(rx);
        tx.notify(Notification::error("ignored"));
    }

    #[tokio::test]
    async fn test_recv_ends_when_senders_gone() {
        let (tx, mut rx) = channel();
        tx.notify(Notification::success("hi"));
        drop(tx);
        assert_eq!(rx.recv().await, Some(Notification::success("hi")));
        assert_eq!(rx.recv().await, None);
    }
}
