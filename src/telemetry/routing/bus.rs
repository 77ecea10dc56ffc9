//! In-process broadcast bus for progress events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

use crate::telemetry::events::ProgressEvent;

const DEFAULT_CAPACITY: usize = 1024;

/// Cloneable emitter. Events carry a per-bus sequence number; emitting with no
/// subscribers is not an error.
#[derive(Clone)]
pub struct ProgressBus {
    sender: broadcast::Sender<ProgressEvent>,
    seq: Arc<AtomicU64>,
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            seq: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn emit(
        &self,
        session: impl Into<String>,
        event_type: impl Into<String>,
        data: Value,
    ) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let event = ProgressEvent::with_now(session, seq, event_type, data);
        if self.sender.send(event).is_err() {
            trace!(seq, "progress event dropped, no subscribers");
        }
        seq
    }
}
