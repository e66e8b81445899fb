//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the hub over which the simulators hand immutable
//! snapshots to the view layer. It is designed to be shared via
//! `Arc<EventBus>`.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use arsafety_core::catalog::TrainingRun;
use arsafety_core::detection::{DetectionFrame, DetectionState};
use arsafety_core::event_names::{
    EVENT_DETECTION_FRAME, EVENT_DETECTION_STATE, EVENT_IMAGE_INGESTED, EVENT_METRICS_TICK,
    EVENT_SESSION_ENDED, EVENT_SESSION_STARTED, EVENT_TRAINING_RECORDED,
};
use arsafety_core::metrics::MetricsSnapshot;

// ---------------------------------------------------------------------------
// DashboardEvent
// ---------------------------------------------------------------------------

/// Something the view layer should re-render for.
///
/// Snapshot payloads are behind `Arc` so fan-out to many subscribers never
/// copies them and no subscriber can mutate what another one sees.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DashboardEvent {
    #[serde(rename = "metrics.tick")]
    Metrics(Arc<MetricsSnapshot>),

    #[serde(rename = "detection.frame")]
    Detections(Arc<DetectionFrame>),

    #[serde(rename = "detection.state")]
    DetectionState { state: DetectionState },

    #[serde(rename = "detection.ingested")]
    ImageIngested {
        detections: usize,
        average_confidence: f64,
        format: Option<String>,
    },

    #[serde(rename = "session.started")]
    SessionStarted { email: String },

    #[serde(rename = "session.ended")]
    SessionEnded,

    #[serde(rename = "training.recorded")]
    TrainingRecorded(Arc<TrainingRun>),
}

impl DashboardEvent {
    /// Canonical dot-separated name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            DashboardEvent::Metrics(_) => EVENT_METRICS_TICK,
            DashboardEvent::Detections(_) => EVENT_DETECTION_FRAME,
            DashboardEvent::DetectionState { .. } => EVENT_DETECTION_STATE,
            DashboardEvent::ImageIngested { .. } => EVENT_IMAGE_INGESTED,
            DashboardEvent::SessionStarted { .. } => EVENT_SESSION_STARTED,
            DashboardEvent::SessionEnded => EVENT_SESSION_ENDED,
            DashboardEvent::TrainingRecorded(_) => EVENT_TRAINING_RECORDED,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use arsafety_events::bus::{DashboardEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DashboardEvent::SessionEnded);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DashboardEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`. Snapshots are superseded
    /// by the next tick anyway, so lagging only costs intermediate frames.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: DashboardEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(DashboardEvent::Metrics(Arc::new(MetricsSnapshot::initial())));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type(), EVENT_METRICS_TICK);
        match received {
            DashboardEvent::Metrics(snapshot) => assert_eq!(snapshot.tick, 0),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers_share_the_same_snapshot() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let frame = Arc::new(DetectionFrame::idle());
        bus.publish(DashboardEvent::Detections(Arc::clone(&frame)));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        match (e1, e2) {
            (DashboardEvent::Detections(a), DashboardEvent::Detections(b)) => {
                assert!(Arc::ptr_eq(&a, &frame));
                assert!(Arc::ptr_eq(&b, &frame));
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(DashboardEvent::SessionEnded);
    }

    #[test]
    fn serialized_tag_matches_event_type() {
        let events = [
            DashboardEvent::DetectionState {
                state: DetectionState::Armed,
            },
            DashboardEvent::SessionStarted {
                email: "demo@arsafety.space".into(),
            },
            DashboardEvent::SessionEnded,
            DashboardEvent::ImageIngested {
                detections: 6,
                average_confidence: 0.9,
                format: None,
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).expect("serialize");
            assert_eq!(json["type"], event.event_type());
        }
    }

    #[test]
    fn state_payload_is_lowercase() {
        let json = serde_json::to_value(DashboardEvent::DetectionState {
            state: DetectionState::Idle,
        })
        .expect("serialize");
        assert_eq!(json["data"]["state"], "idle");
    }
}
