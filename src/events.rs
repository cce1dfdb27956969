//! Notifications emitted after persistence.

use crate::persist::UrlIndexEntry;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Something listeners may want to react to once data is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ImportEvent {
    /// A persistence run finished, with or without item errors.
    DataImported,
    /// Entries to add to the URL search index.
    UrlIndexUpdate(Vec<UrlIndexEntry>),
}

/// Fan-out of [`ImportEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ImportEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    /// `capacity` is the number of events buffered per slow subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ImportEvent> {
        self.tx.subscribe()
    }

    /// Send an event. Having no subscribers is not an error.
    pub fn emit(&self, event: ImportEvent) -> usize {
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!(delivered, "emitted import event");
        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequestType;

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let entry = UrlIndexEntry {
            id: "r".to_string(),
            url: "http://x".to_string(),
            kind: RequestType::Saved,
        };
        assert_eq!(bus.emit(ImportEvent::DataImported), 1);
        bus.emit(ImportEvent::UrlIndexUpdate(vec![entry.clone()]));

        assert_eq!(rx.recv().await.unwrap(), ImportEvent::DataImported);
        assert_eq!(rx.recv().await.unwrap(), ImportEvent::UrlIndexUpdate(vec![entry]));
    }

    #[test]
    fn emitting_without_subscribers_is_fine() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.emit(ImportEvent::DataImported), 0);
    }

    #[test]
    fn serializes_tagged() {
        let value = serde_json::to_value(ImportEvent::DataImported).unwrap();
        assert_eq!(value["event"], "data-imported");
    }
}
