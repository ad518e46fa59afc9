//! Recurring collection cycles over the location registry.
//!
//! A cycle visits every registered location in order. For each one it
//! fetches the operator and competitor snapshots one after another, scores
//! them, asks the recommender for display text, commits the record, and
//! publishes it. Consecutive locations are separated by the configured
//! delay to bound load on the metrics provider.
//!
//! Only one full cycle runs at a time. A timer firing while a cycle is in
//! flight is counted as skipped and does nothing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use qcsite_core::{Location, LocationRegistry, ServiceId};
use qcsite_scoring::{score, Recommender};
use qcsite_scraper::{fetch_or_fallback, MetricsProvider};
use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::CollectorError;
use crate::record::LocationRecord;
use crate::sink::UpdateSink;
use crate::store::LocationStore;

/// Default timer period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10_000);
/// Shortest timer period [`CollectionScheduler::start`] accepts. Periods
/// must also be whole seconds.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
/// Slack added to the stop drain on top of one location's worst case.
const DRAIN_GRACE: Duration = Duration::from_secs(1);
/// Default pause between consecutive locations.
pub const DEFAULT_INTER_LOCATION_DELAY: Duration = Duration::from_millis(1_000);

/// Timer settings passed to [`CollectionScheduler::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSettings {
    pub interval: Duration,
    pub inter_location_delay: Duration,
}

impl CycleSettings {
    #[must_use]
    pub fn from_millis(interval_ms: u64, inter_location_delay_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            inter_location_delay: Duration::from_millis(inter_location_delay_ms),
        }
    }

    fn validate(self) -> Result<Self, CollectorError> {
        if self.interval.is_zero() {
            return Err(CollectorError::InvalidSettings(
                "interval must be greater than zero".to_string(),
            ));
        }
        // The job scheduler ticks in whole seconds.
        if self.interval < MIN_INTERVAL {
            return Err(CollectorError::InvalidSettings(format!(
                "interval must be at least {}ms",
                MIN_INTERVAL.as_millis()
            )));
        }
        if self.interval.subsec_nanos() != 0 {
            return Err(CollectorError::InvalidSettings(format!(
                "interval must be a whole number of seconds, got {}ms",
                self.interval.as_millis()
            )));
        }
        Ok(self)
    }
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            inter_location_delay: DEFAULT_INTER_LOCATION_DELAY,
        }
    }
}

/// What a call to [`CollectionScheduler::run_cycle`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every registered location was attempted.
    Completed {
        locations: usize,
        fallbacks: usize,
        elapsed: Duration,
    },
    /// A stop request arrived mid-cycle. Records committed before the stop
    /// remain in the store.
    Abandoned { locations: usize },
    /// Another cycle was already in flight.
    Skipped,
    /// [`CollectionScheduler::stop`] has been called; nothing was collected.
    Stopped,
}

/// Point-in-time view of the scheduler for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    /// Whether the recurring timer is registered.
    pub running: bool,
    pub cycle_in_progress: bool,
    pub cycles_completed: u64,
    pub cycles_skipped: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub tracked_locations: usize,
    pub registered_locations: usize,
    /// Timer period, present while running.
    pub interval_ms: Option<u64>,
    pub inter_location_delay_ms: u64,
}

/// Releases the cycle flag when a cycle ends, including when its future is
/// dropped part-way through.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
    idle: &'a Notify,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.idle.notify_waiters();
    }
}

struct Collector {
    registry: LocationRegistry,
    provider: Arc<dyn MetricsProvider>,
    recommender: Arc<dyn Recommender>,
    store: LocationStore,
    sink: Arc<dyn UpdateSink>,
    provider_timeout: Duration,
    cycle_running: AtomicBool,
    cycle_idle: Notify,
    stop_requested: AtomicBool,
    inter_location_delay_ms: AtomicU64,
    cycles_completed: AtomicU64,
    cycles_skipped: AtomicU64,
    last_cycle_at: RwLock<Option<DateTime<Utc>>>,
}

impl Collector {
    fn is_stopped(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Worst-case time for one location: three bounded provider calls plus
    /// one recommender call, preceded by the inter-location pause.
    fn location_budget(&self) -> Duration {
        let delay = Duration::from_millis(self.inter_location_delay_ms.load(Ordering::Relaxed));
        self.provider_timeout
            .saturating_mul(3)
            .saturating_add(self.recommender.max_latency())
            .saturating_add(delay)
            .saturating_add(DRAIN_GRACE)
    }

    async fn run_cycle(&self) -> CycleOutcome {
        if self.is_stopped() {
            tracing::debug!("collector: stopped; cycle not run");
            return CycleOutcome::Stopped;
        }
        if self
            .cycle_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("collector: cycle already in progress; skipping");
            return CycleOutcome::Skipped;
        }
        let _guard = CycleGuard {
            flag: &self.cycle_running,
            idle: &self.cycle_idle,
        };

        let started = Instant::now();
        let delay = Duration::from_millis(self.inter_location_delay_ms.load(Ordering::Relaxed));
        tracing::info!(
            locations = self.registry.len(),
            "collector: starting collection cycle"
        );

        let mut locations = 0usize;
        let mut fallbacks = 0usize;
        for (index, location) in self.registry.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.is_stopped() {
                tracing::info!(
                    completed = locations,
                    "collector: stop requested; abandoning cycle"
                );
                return CycleOutcome::Abandoned { locations };
            }

            let record = self.collect_location(location).await;
            locations += 1;
            fallbacks += record.fallback_count();
        }

        let elapsed = started.elapsed();
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        *self
            .last_cycle_at
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

        tracing::info!(
            locations,
            fallbacks,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "collector: collection cycle complete"
        );
        CycleOutcome::Completed {
            locations,
            fallbacks,
            elapsed,
        }
    }

    async fn collect_location(&self, location: &Location) -> Arc<LocationRecord> {
        let provider = self.provider.as_ref();
        let timeout = self.provider_timeout;
        let [first, second] = ServiceId::COMPETITORS;

        let own = fetch_or_fallback(provider, location, ServiceId::OPERATOR, timeout).await;
        let competitor_a = fetch_or_fallback(provider, location, first, timeout).await;
        let competitor_b = fetch_or_fallback(provider, location, second, timeout).await;

        let result = score(&own, &competitor_a, &competitor_b);
        let summary = self.recommender.describe(location, &result).await;

        let record = Arc::new(LocationRecord {
            location: location.clone(),
            own,
            competitors: [competitor_a, competitor_b],
            result,
            summary,
            collected_at: Utc::now(),
        });
        self.store.upsert(Arc::clone(&record));

        tracing::debug!(
            location = %location.name,
            score = record.result.warehouse_score,
            tier = %record.result.recommendation_tier,
            "collector: location record committed"
        );

        if let Err(e) = self.sink.publish(&record) {
            tracing::debug!(location = %location.name, error = %e, "collector: publish skipped");
        }
        record
    }

    /// Waits for an in-flight cycle to reach a location boundary.
    async fn wait_idle(&self) {
        loop {
            let notified = self.cycle_idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.cycle_running.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }
}

/// Owns the recurring timer and the collection state for one registry.
pub struct CollectionScheduler {
    collector: Arc<Collector>,
    job: Mutex<Option<(JobScheduler, CycleSettings)>>,
}

impl CollectionScheduler {
    /// `provider_timeout` bounds every single provider call; a call that
    /// exceeds it is replaced by the fallback snapshot.
    #[must_use]
    pub fn new(
        registry: LocationRegistry,
        provider: Arc<dyn MetricsProvider>,
        recommender: Arc<dyn Recommender>,
        store: LocationStore,
        sink: Arc<dyn UpdateSink>,
        provider_timeout: Duration,
    ) -> Self {
        let delay_ms = u64::try_from(DEFAULT_INTER_LOCATION_DELAY.as_millis()).unwrap_or(u64::MAX);
        Self {
            collector: Arc::new(Collector {
                registry,
                provider,
                recommender,
                store,
                sink,
                provider_timeout,
                cycle_running: AtomicBool::new(false),
                cycle_idle: Notify::new(),
                stop_requested: AtomicBool::new(false),
                inter_location_delay_ms: AtomicU64::new(delay_ms),
                cycles_completed: AtomicU64::new(0),
                cycles_skipped: AtomicU64::new(0),
                last_cycle_at: RwLock::new(None),
            }),
            job: Mutex::new(None),
        }
    }

    /// Overrides the pause between consecutive locations for cycles run
    /// through [`Self::run_cycle`] before [`Self::start`] is called.
    #[must_use]
    pub fn with_inter_location_delay(self, delay: Duration) -> Self {
        self.collector.inter_location_delay_ms.store(
            u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
        self
    }

    /// Registers the recurring cycle timer. The first cycle fires one
    /// interval after this call.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::InvalidSettings`] for an interval below
    /// [`MIN_INTERVAL`] or with a fractional second,
    /// [`CollectorError::Stopped`] after [`Self::stop`],
    /// [`CollectorError::AlreadyRunning`] if the timer is already registered,
    /// or [`CollectorError::Scheduler`] if the job scheduler fails.
    pub async fn start(&self, settings: CycleSettings) -> Result<(), CollectorError> {
        let settings = settings.validate()?;
        if self.collector.is_stopped() {
            return Err(CollectorError::Stopped);
        }
        let mut slot = self.job.lock().await;
        if slot.is_some() {
            return Err(CollectorError::AlreadyRunning);
        }

        self.collector.inter_location_delay_ms.store(
            u64::try_from(settings.inter_location_delay.as_millis()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );

        let scheduler = JobScheduler::new().await?;
        let collector = Arc::clone(&self.collector);
        let job = Job::new_repeated_async(settings.interval, move |_uuid, _lock| {
            let collector = Arc::clone(&collector);
            Box::pin(async move {
                collector.run_cycle().await;
            })
        })?;
        scheduler.add(job).await?;
        scheduler.start().await?;

        tracing::info!(
            interval_ms = u64::try_from(settings.interval.as_millis()).unwrap_or(u64::MAX),
            inter_location_delay_ms =
                u64::try_from(settings.inter_location_delay.as_millis()).unwrap_or(u64::MAX),
            locations = self.collector.registry.len(),
            "collector: scheduler started"
        );
        *slot = Some((scheduler, settings));
        Ok(())
    }

    /// Halts the timer, lets an in-flight cycle stop at its next location
    /// boundary, then shuts the metrics provider down.
    ///
    /// Stopping is final: afterwards [`Self::start`] and [`Self::refresh_one`]
    /// return [`CollectorError::Stopped`] and [`Self::run_cycle`] returns
    /// [`CycleOutcome::Stopped`]. Committed records stay in the store and
    /// remain readable. Safe to call more than once.
    pub async fn stop(&self) {
        self.collector.stop_requested.store(true, Ordering::Release);

        if let Some((mut scheduler, _)) = self.job.lock().await.take() {
            if let Err(e) = scheduler.shutdown().await {
                tracing::warn!(error = %e, "collector: job scheduler shutdown failed");
            }
        }

        let drain = self.collector.location_budget();
        if tokio::time::timeout(drain, self.collector.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                drain_ms = u64::try_from(drain.as_millis()).unwrap_or(u64::MAX),
                "collector: in-flight cycle did not reach a boundary before shutdown"
            );
        }

        self.collector.provider.shutdown().await;
        tracing::info!(provider = self.collector.provider.name(), "collector: stopped");
    }

    /// Runs one full cycle now, unless one is already in flight or the
    /// scheduler has been stopped.
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.collector.run_cycle().await
    }

    /// Collects one location immediately, independent of any running cycle.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::UnknownLocation`] if `name` is not in the
    /// registry (case-insensitive), or [`CollectorError::Stopped`] after
    /// [`Self::stop`].
    pub async fn refresh_one(&self, name: &str) -> Result<Arc<LocationRecord>, CollectorError> {
        if self.collector.is_stopped() {
            return Err(CollectorError::Stopped);
        }
        let location = self
            .collector
            .registry
            .find(name)
            .ok_or_else(|| CollectorError::UnknownLocation(name.to_string()))?;
        Ok(self.collector.collect_location(location).await)
    }

    /// Latest record per location, sorted by name.
    #[must_use]
    pub fn get_all(&self) -> Vec<Arc<LocationRecord>> {
        self.collector.store.all()
    }

    /// Latest record for a location, matched case-insensitively against the
    /// registry. `None` for unregistered names and for locations not yet
    /// collected.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<LocationRecord>> {
        let location = self.collector.registry.find(name)?;
        self.collector.store.get(&location.name)
    }

    #[must_use]
    pub fn registry(&self) -> &LocationRegistry {
        &self.collector.registry
    }

    #[must_use]
    pub fn store(&self) -> &LocationStore {
        &self.collector.store
    }

    pub async fn status(&self) -> SchedulerStatus {
        let settings = self.job.lock().await.as_ref().map(|(_, s)| *s);
        let c = &self.collector;
        SchedulerStatus {
            running: settings.is_some(),
            cycle_in_progress: c.cycle_running.load(Ordering::Acquire),
            cycles_completed: c.cycles_completed.load(Ordering::Relaxed),
            cycles_skipped: c.cycles_skipped.load(Ordering::Relaxed),
            last_cycle_at: *c.last_cycle_at.read().unwrap_or_else(PoisonError::into_inner),
            tracked_locations: c.store.len(),
            registered_locations: c.registry.len(),
            interval_ms: settings
                .map(|s| u64::try_from(s.interval.as_millis()).unwrap_or(u64::MAX)),
            inter_location_delay_ms: c.inter_location_delay_ms.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
