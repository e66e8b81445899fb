//! Bounded recorder of recent dashboard events.
//!
//! [`EventHistory::run`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and keeps the most recent events in memory. It runs as a long-lived
//! background task and stops when the bus is dropped.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast;

use arsafety_core::metrics::MetricsSnapshot;
use arsafety_core::types::Timestamp;

use crate::bus::DashboardEvent;

/// Default number of events retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 512;

/// An event together with when the recorder saw it.
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub received_at: Timestamp,
    pub event: DashboardEvent,
}

#[derive(Debug, Default)]
struct Inner {
    events: VecDeque<RecordedEvent>,
    lagged: u64,
}

/// Ring buffer of the latest events.
pub struct EventHistory {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl EventHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the recording loop until the bus closes.
    pub async fn run(history: Arc<Self>, mut receiver: broadcast::Receiver<DashboardEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => history.record(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    history.lock().lagged += n;
                    tracing::warn!(skipped = n, "Event history lagged, some events were not recorded");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(recorded = history.len(), "Event bus closed, history recorder stopping");
                    break;
                }
            }
        }
    }

    pub fn record(&self, event: DashboardEvent) {
        let mut inner = self.lock();
        if inner.events.len() == self.capacity {
            inner.events.pop_front();
        }
        inner.events.push_back(RecordedEvent {
            received_at: Utc::now(),
            event,
        });
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events dropped because the recorder fell behind the bus.
    pub fn lagged(&self) -> u64 {
        self.lock().lagged
    }

    /// Up to `n` most recent events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<RecordedEvent> {
        let inner = self.lock();
        let skip = inner.events.len().saturating_sub(n);
        inner.events.iter().skip(skip).cloned().collect()
    }

    /// Retained metrics snapshots, oldest first. Feeds the live trend chart.
    pub fn metrics_series(&self) -> Vec<Arc<MetricsSnapshot>> {
        self.lock()
            .events
            .iter()
            .filter_map(|r| match &r.event {
                DashboardEvent::Metrics(snapshot) => Some(Arc::clone(snapshot)),
                _ => None,
            })
            .collect()
    }

    /// Count of retained events with the given type name.
    pub fn count_of(&self, event_type: &str) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|r| r.event.event_type() == event_type)
            .count()
    }
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use arsafety_core::event_names::{EVENT_METRICS_TICK, EVENT_SESSION_ENDED};

    fn metrics(tick: u64) -> DashboardEvent {
        DashboardEvent::Metrics(Arc::new(MetricsSnapshot {
            tick,
            ..MetricsSnapshot::initial()
        }))
    }

    #[test]
    fn capacity_evicts_oldest() {
        let history = EventHistory::new(3);
        for tick in 0..5 {
            history.record(metrics(tick));
        }
        let ticks: Vec<u64> = history.metrics_series().iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![2, 3, 4]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let history = EventHistory::default();
        history.record(metrics(1));
        history.record(DashboardEvent::SessionEnded);
        history.record(metrics(2));

        let recent = history.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event.event_type(), EVENT_SESSION_ENDED);
        assert_eq!(recent[1].event.event_type(), EVENT_METRICS_TICK);
        assert_eq!(history.count_of(EVENT_METRICS_TICK), 2);
    }

    #[tokio::test]
    async fn run_records_until_bus_is_dropped() {
        let bus = EventBus::default();
        let history = Arc::new(EventHistory::default());
        let handle = tokio::spawn(EventHistory::run(Arc::clone(&history), bus.subscribe()));

        bus.publish(metrics(1));
        bus.publish(DashboardEvent::SessionEnded);
        drop(bus);

        handle.await.expect("recorder task should finish");
        assert_eq!(history.len(), 2);
        assert_eq!(history.lagged(), 0);
    }
}
