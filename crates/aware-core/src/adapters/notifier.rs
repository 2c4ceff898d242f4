//! Notification sinks.

use parking_lot::Mutex;

use crate::domain::{Completion, Notification, TransactionId};
use crate::ports::NotificationSink;

/// Collects notifications in memory. Intended for tests and tooling.
#[derive(Debug, Default)]
pub struct InMemoryNotificationSink {
    notifications: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    /// Remove and return everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock())
    }

    /// Completions received so far.
    pub fn completions(&self) -> Vec<Completion> {
        self.notifications
            .lock()
            .iter()
            .filter_map(Notification::as_completion)
            .cloned()
            .collect()
    }

    /// Completions carrying `transaction_id`.
    pub fn completions_for(&self, transaction_id: TransactionId) -> Vec<Completion> {
        self.completions()
            .into_iter()
            .filter(|c| c.transaction_id == transaction_id)
            .collect()
    }

    /// Number of notifications received.
    pub fn len(&self) -> usize {
        self.notifications.lock().len()
    }

    /// True when nothing was received.
    pub fn is_empty(&self) -> bool {
        self.notifications.lock().is_empty()
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

#[cfg(feature = "runtime")]
pub use channel::ChannelNotificationSink;

#[cfg(feature = "runtime")]
mod channel {
    use tokio::sync::mpsc;
    use tracing::warn;

    use crate::domain::Notification;
    use crate::ports::NotificationSink;

    /// Forwards notifications into an unbounded tokio channel.
    ///
    /// Unbounded so the owner task never blocks on a slow consumer.
    #[derive(Debug, Clone)]
    pub struct ChannelNotificationSink {
        sender: mpsc::UnboundedSender<Notification>,
    }

    impl ChannelNotificationSink {
        /// Create a sink and the receiver it feeds.
        pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
            let (sender, receiver) = mpsc::unbounded_channel();
            (Self { sender }, receiver)
        }
    }

    impl NotificationSink for ChannelNotificationSink {
        fn notify(&self, notification: Notification) {
            if self.sender.send(notification).is_err() {
                warn!("notification receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommandKind, CompletionDetail, MacAddress};

    #[test]
    fn test_in_memory_sink_filters_completions() {
        let sink = InMemoryNotificationSink::new();
        sink.notify(Notification::IdentityChanged {
            address: MacAddress::default(),
        });
        sink.notify(Notification::Completed(Completion {
            transaction_id: TransactionId::new(4),
            kind: CommandKind::Disable,
            result: Ok(CompletionDetail::Disabled),
        }));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.completions_for(TransactionId::new(4)).len(), 1);
        assert!(sink.completions_for(TransactionId::new(5)).is_empty());

        assert_eq!(sink.drain().len(), 2);
        assert!(sink.is_empty());
    }
}
