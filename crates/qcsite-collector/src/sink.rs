//! Fan-out of committed records to downstream consumers.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::SinkError;
use crate::record::LocationRecord;

/// Event name carried by every published record.
pub const LOCATION_UPDATED_EVENT: &str = "location-data-updated";

/// Receives each record after it is committed to the store.
///
/// Errors are reported to the caller for logging only; the collector never
/// lets a sink failure affect a cycle.
pub trait UpdateSink: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SinkError`] when the record could not be delivered.
    fn publish(&self, record: &Arc<LocationRecord>) -> Result<(), SinkError>;
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl UpdateSink for NullSink {
    fn publish(&self, _record: &Arc<LocationRecord>) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-process pub/sub over a `tokio` broadcast channel.
///
/// Slow subscribers that fall more than `capacity` records behind observe a
/// lag and skip ahead; publishers never block.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<Arc<LocationRecord>>,
}

impl BroadcastSink {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<LocationRecord>> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl UpdateSink for BroadcastSink {
    fn publish(&self, record: &Arc<LocationRecord>) -> Result<(), SinkError> {
        self.tx
            .send(Arc::clone(record))
            .map(|_| ())
            .map_err(|_| SinkError::NoSubscribers)
    }
}
