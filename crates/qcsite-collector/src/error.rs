use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("invalid cycle settings: {0}")]
    InvalidSettings(String),

    #[error("collection scheduler is already running")]
    AlreadyRunning,

    #[error("collection scheduler has been stopped")]
    Stopped,

    #[error("unknown location: {0}")]
    UnknownLocation(String),

    #[error("job scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// Failure to hand a record to downstream consumers. Never fatal to a cycle.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("no subscribers")]
    NoSubscribers,
}
