//! Periodic collection of provider metrics for the location registry.
//!
//! [`CollectionScheduler`] walks the registry on a timer, fetches the three
//! service snapshots for each location, scores them, commits the result to
//! a [`LocationStore`], and publishes it to an [`UpdateSink`]. At most one
//! full cycle runs at a time.

pub mod error;
pub mod record;
pub mod scheduler;
pub mod sink;
pub mod store;

pub use error::{CollectorError, SinkError};
pub use record::LocationRecord;
pub use scheduler::{CollectionScheduler, CycleOutcome, CycleSettings, SchedulerStatus};
pub use sink::{BroadcastSink, NullSink, UpdateSink, LOCATION_UPDATED_EVENT};
pub use store::LocationStore;
