//! Timer-driven telemetry simulator.
//!
//! [`MetricsSimulator::start`] spawns a ticker that walks the current
//! [`MetricsSnapshot`] every period. Every write happens under the state
//! lock after checking the run epoch, so once [`MetricsSimulator::stop`]
//! returns no tick from that run can land.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use arsafety_core::catalog::{RunStatus, TrainingRun};
use arsafety_core::error::CoreError;
use arsafety_core::metrics::{MetricsBounds, MetricsSnapshot};
use arsafety_core::random::SimRng;
use arsafety_events::{DashboardEvent, EventBus};

struct State {
    /// Bumped by every start and stop. A tick only writes when its
    /// run's epoch is still current.
    epoch: u64,
    rng: SimRng,
    bounds: MetricsBounds,
    active: Option<CancellationToken>,
}

struct Shared {
    state: Mutex<State>,
    tx: watch::Sender<Arc<MetricsSnapshot>>,
    bus: Option<Arc<EventBus>>,
    period: Duration,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the snapshot. Caller holds the state lock.
    fn publish(&self, snapshot: MetricsSnapshot) {
        let snapshot = Arc::new(snapshot);
        self.tx.send_replace(Arc::clone(&snapshot));
        if let Some(bus) = &self.bus {
            bus.publish(DashboardEvent::Metrics(snapshot));
        }
    }

    /// Advance one step for run `epoch`. Returns `false` once the run is stale.
    fn tick(&self, epoch: u64) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        let State { rng, bounds, .. } = &mut *state;
        let next = self.tx.borrow().next(bounds, rng);
        tracing::trace!(tick = next.tick, accuracy = next.accuracy, "Metrics tick");
        self.publish(next);
        true
    }
}

/// Handle to one running ticker, returned by [`MetricsSimulator::start`].
#[derive(Debug)]
pub struct MetricsHandle {
    epoch: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MetricsHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the ticker task to exit. Only meaningful after a stop.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Metrics ticker task did not exit cleanly");
        }
    }
}

/// Owner of the live telemetry snapshot.
///
/// Cheap to clone; clones share the same snapshot and ticker state.
#[derive(Clone)]
pub struct MetricsSimulator {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for MetricsSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsSimulator").finish_non_exhaustive()
    }
}

impl MetricsSimulator {
    /// Simulator with the dashboard walk bounds. A zero period is rejected.
    pub fn new(period: Duration, rng: SimRng, bus: Option<Arc<EventBus>>) -> Result<Self, CoreError> {
        Self::with_bounds(period, MetricsBounds::DASHBOARD, rng, bus)
    }

    /// Simulator with custom walk bounds, rejected when inconsistent or when
    /// the period is zero.
    pub fn with_bounds(
        period: Duration,
        bounds: MetricsBounds,
        rng: SimRng,
        bus: Option<Arc<EventBus>>,
    ) -> Result<Self, CoreError> {
        bounds.validate()?;
        if period.is_zero() {
            return Err(CoreError::Validation("metrics period must be positive".into()));
        }
        Ok(Self::build(period, bounds, rng, bus))
    }

    fn build(period: Duration, bounds: MetricsBounds, rng: SimRng, bus: Option<Arc<EventBus>>) -> Self {
        let (tx, _) = watch::channel(Arc::new(MetricsSnapshot::initial()));
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    epoch: 0,
                    rng,
                    bounds,
                    active: None,
                }),
                tx,
                bus,
                period,
            }),
        }
    }

    /// Begin ticking. A run already in progress is superseded.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> MetricsHandle {
        let cancel = CancellationToken::new();
        let epoch = {
            let mut state = self.shared.lock();
            if let Some(previous) = state.active.replace(cancel.clone()) {
                previous.cancel();
            }
            state.epoch += 1;
            state.epoch
        };

        let period = self.shared.period;
        tracing::info!(epoch, period_ms = period.as_millis() as u64, "Metrics simulator started");

        let task = tokio::spawn(run_ticker(Arc::clone(&self.shared), epoch, cancel.clone()));
        MetricsHandle { epoch, cancel, task }
    }

    /// Stop the run behind `handle`. The last snapshot stays readable.
    ///
    /// After this returns no further snapshot from that run is written,
    /// even if its timer had already fired.
    pub fn stop(&self, handle: &MetricsHandle) {
        {
            let mut state = self.shared.lock();
            if state.epoch == handle.epoch {
                state.epoch += 1;
                state.active = None;
            }
        }
        handle.cancel.cancel();
        tracing::info!(epoch = handle.epoch, "Metrics simulator stopped");
    }

    /// Latest snapshot. Never blocks on the ticker.
    pub fn current(&self) -> Arc<MetricsSnapshot> {
        self.shared.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MetricsSnapshot>> {
        self.shared.tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().active.is_some()
    }

    /// Restore the initial snapshot. A running ticker keeps going from it.
    pub fn reset(&self) {
        let state = self.shared.lock();
        self.shared.publish(MetricsSnapshot::initial());
        drop(state);
    }

    /// Move accuracy to a completed run's post-training mAP.
    ///
    /// Runs that failed or carry no metrics leave the snapshot untouched and
    /// return `None`.
    pub fn apply_retrain(&self, run: &TrainingRun) -> Option<Arc<MetricsSnapshot>> {
        let map = match (run.status, run.metrics) {
            (RunStatus::Completed, Some(metrics)) => metrics.map.after,
            _ => return None,
        };

        let state = self.shared.lock();
        let next = self.shared.tx.borrow().with_accuracy(map, &state.bounds);
        tracing::info!(run_id = run.id, accuracy = next.accuracy, "Applied retrained accuracy");
        self.shared.publish(next);
        drop(state);
        Some(self.current())
    }
}

async fn run_ticker(shared: Arc<Shared>, epoch: u64, cancel: CancellationToken) {
    let period = shared.period;
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(epoch, "Metrics ticker cancelled");
                break;
            }
            _ = interval.tick() => {
                if !shared.tick(epoch) {
                    tracing::debug!(epoch, "Metrics ticker superseded");
                    break;
                }
            }
        }
    }
}
