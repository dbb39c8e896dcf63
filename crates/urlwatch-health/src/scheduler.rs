//! Due-check scheduler: the background loop that dispatches probes.
//!
//! Every tick the scheduler reads the active monitors and each one's
//! latest health record, and spawns a probe task for every monitor that
//! is due. It keeps no record of check times in memory: due-ness is
//! always recomputed from the store. The only in-memory state is the set
//! of monitors whose probe task is still running, which keeps a slow
//! probe from being dispatched a second time by the next tick.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use urlwatch_core::TICK_INTERVAL;
use urlwatch_state::{HealthRecord, HealthRecordStore, Monitor, MonitorId, MonitorRegistry};

use crate::error::SchedulerResult;
use crate::prober::Prober;

/// Whether `monitor` should be probed at `now`.
///
/// Inactive monitors are never due. A monitor with no history is always
/// due; otherwise it is due once at least `check_interval` minutes have
/// passed since its latest record.
pub fn is_due(monitor: &Monitor, latest: Option<&HealthRecord>, now: DateTime<Utc>) -> bool {
    if !monitor.is_active() {
        return false;
    }
    match latest {
        None => true,
        Some(record) => now - record.checked_at >= monitor.interval(),
    }
}

type InFlight = Arc<Mutex<HashSet<MonitorId>>>;

/// Marks a monitor as having a running probe; released on drop.
struct InFlightGuard {
    set: InFlight,
    monitor_id: MonitorId,
}

impl InFlightGuard {
    /// Claim `monitor_id`, or `None` if a probe for it is already running.
    fn claim(set: &InFlight, monitor_id: MonitorId) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(monitor_id);
        inserted.then(|| Self {
            set: Arc::clone(set),
            monitor_id,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.monitor_id);
    }
}

/// The due-check scheduler.
///
/// Generic over the store so tests can inject storage failures; in
/// production `S` is [`urlwatch_state::StateStore`].
pub struct Scheduler<S> {
    store: S,
    prober: Arc<Prober>,
    in_flight: InFlight,
    permits: Arc<Semaphore>,
    tick_interval: Duration,
}

impl<S> Scheduler<S>
where
    S: MonitorRegistry + HealthRecordStore + Clone + Send + Sync + 'static,
{
    /// Create a scheduler. At most `max_concurrent_probes` probes run at
    /// once; further dispatched probes wait for a slot.
    pub fn new(store: S, prober: Prober, max_concurrent_probes: usize) -> Self {
        Self {
            store,
            prober: Arc::new(prober),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            permits: Arc::new(Semaphore::new(max_concurrent_probes.max(1))),
            tick_interval: TICK_INTERVAL,
        }
    }

    /// Override the tick cadence (for testing).
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Spawn the scheduling loop. The first tick runs immediately.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle {
            handle,
            shutdown_tx,
        }
    }

    /// Run ticks until `shutdown` fires or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(tick_interval = ?self.tick_interval, "scheduler running");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick() {
                        Ok(dispatched) if !dispatched.is_empty() => {
                            debug!(dispatched = dispatched.len(), "tick dispatched probes");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "tick aborted, retrying on next tick");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    debug!(in_flight = self.in_flight_count(), "scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Run one tick against the current time.
    pub fn tick(&self) -> SchedulerResult<Vec<MonitorId>> {
        self.tick_at(Utc::now())
    }

    /// Run one tick as if the current time were `now`, returning the ids
    /// of the monitors whose probes were dispatched.
    ///
    /// Must be called within a Tokio runtime. A storage error aborts the
    /// remaining monitors of this tick; probes already dispatched keep
    /// running.
    pub fn tick_at(&self, now: DateTime<Utc>) -> SchedulerResult<Vec<MonitorId>> {
        let monitors = self.store.list_monitors(true)?;
        let mut dispatched = Vec::new();

        for monitor in monitors {
            let latest = self.store.latest_record(monitor.id)?;
            if !is_due(&monitor, latest.as_ref(), now) {
                continue;
            }
            let monitor_id = monitor.id;
            if self.dispatch(monitor) {
                dispatched.push(monitor_id);
            } else {
                debug!(monitor_id, "probe still in flight, skipping");
            }
        }

        Ok(dispatched)
    }

    /// Number of monitors with a probe task still running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Spawn a probe task for `monitor` without waiting for it.
    fn dispatch(&self, monitor: Monitor) -> bool {
        let Some(guard) = InFlightGuard::claim(&self.in_flight, monitor.id) else {
            return false;
        };

        let store = self.store.clone();
        let prober = Arc::clone(&self.prober);
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let _guard = guard;
            // The semaphore is never closed.
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };

            let record = prober.probe(monitor.id, &monitor.url).await;
            match store.append_record(record) {
                Ok(saved) => {
                    debug!(
                        monitor_id = saved.monitor_id,
                        record_id = saved.id,
                        is_up = saved.is_up,
                        "health record saved"
                    );
                }
                Err(e) => {
                    error!(monitor_id = monitor.id, error = %e, "failed to save health record");
                }
            }
        });

        true
    }
}

/// Handle to a running scheduler loop.
pub struct SchedulerHandle {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Stop ticking. Probes already dispatched are not cancelled.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
        info!("scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
