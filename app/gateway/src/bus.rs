//! The `llm-stream` publish channel.

use quill_model::StreamEvent;
use tokio::sync::broadcast;

/// Event channel name the UI subscribes to.
pub const STREAM_CHANNEL: &str = "llm-stream";

/// Default buffer size. The UI drains faster than the network produces;
/// lagging receivers drop oldest events.
const DEFAULT_CAPACITY: usize = 256;

/// Single-producer-multiple-consumer channel carrying normalized events.
///
/// Delivery is in publish order per sender and only to current
/// subscribers; nothing is persisted. Receivers filter by `stream_id`.
#[derive(Debug, Clone)]
pub struct StreamBus {
    tx: broadcast::Sender<StreamEvent>,
}

impl StreamBus {
    /// Create a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Events published with no live subscriber are
    /// dropped, matching fire-and-forget UI emission.
    pub fn publish(&self, event: StreamEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to all events.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.tx.subscribe()
    }
}

impl Default for StreamBus {
    fn default() -> Self {
        Self::new()
    }
}
