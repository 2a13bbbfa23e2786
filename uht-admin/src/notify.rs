//! User notifications
//!
//! The console reports outcomes through a [`Notifier`]. Delivery is fire-and-forget:
//! the console never waits on the notifier and ignores whatever it does with the message.

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Variant {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub variant: Variant,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Variant::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Variant::Error, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Variant::Info, title, message)
    }

    fn new(variant: Variant, title: impl Into<String>, message: impl Into<String>) -> Self {
        Notification {
            variant,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Receiver of console notifications
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Notifier that keeps notifications in a shared queue.
///
/// Clones share the same queue, so one clone can be handed to the console while
/// another is drained by the renderer (or inspected by tests).
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    queue: Arc<Mutex<VecDeque<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the oldest notification.
    pub fn pop(&self) -> Option<Notification> {
        self.queue.lock().pop_front()
    }

    /// Removes and returns all queued notifications.
    pub fn drain(&self) -> Vec<Notification> {
        self.queue.lock().drain(..).collect()
    }

    /// Returns a copy of queued notifications without removing them.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.queue.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.queue.lock().push_back(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_queue() {
        let log = NotificationLog::new();
        let handle = log.clone();
        handle.notify(Notification::info("No changes", "No changes to save"));
        handle.notify(Notification::error("Error saving configuration", "Save failed"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.pop().map(|n| n.variant), Some(Variant::Info));
        let rest = log.drain();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].message, "Save failed");
        assert!(handle.is_empty());
    }

    #[test]
    fn variant_names() {
        assert_eq!(Variant::Success.to_string(), "success");
        assert_eq!("error".parse::<Variant>().ok(), Some(Variant::Error));
    }
}
