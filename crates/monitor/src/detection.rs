//! Timer-driven detection simulator.
//!
//! Wraps a [`DetectionFeed`] with a jitter ticker that only runs while the
//! feed is armed, plus the simulated still-image ingest path.

use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use arsafety_core::detection::{
    average_confidence, jittered_set, DetectionFeed, DetectionFrame, DetectionInstance, DetectionState,
    INGEST_JITTER,
};
use arsafety_core::error::CoreError;
use arsafety_core::random::SimRng;
use arsafety_core::types::Timestamp;
use arsafety_events::{DashboardEvent, EventBus};

use crate::camera::{Frame, FrameSource};

// ---------------------------------------------------------------------------
// Ingest result
// ---------------------------------------------------------------------------

/// Format and size read from an image header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Lowercase format name, e.g. `png`.
    pub format: String,
    pub width: u32,
    pub height: u32,
}

/// Outcome of [`DetectionSimulator::ingest_image`].
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub detections: Vec<DetectionInstance>,
    /// `None` when the bytes are not a recognizable image.
    pub image: Option<ImageInfo>,
    pub completed_at: Timestamp,
}

impl DetectionResult {
    pub fn average_confidence(&self) -> f64 {
        average_confidence(&self.detections)
    }
}

/// Read format and dimensions from the header without decoding pixels.
pub fn sniff_image(bytes: &[u8]) -> Option<ImageInfo> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    let format = reader.format()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(ImageInfo {
        format: format!("{format:?}").to_lowercase(),
        width,
        height,
    })
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

struct State {
    epoch: u64,
    feed: DetectionFeed,
    rng: SimRng,
    active: Option<CancellationToken>,
}

struct Shared {
    state: Mutex<State>,
    tx: watch::Sender<Arc<DetectionFrame>>,
    bus: Option<Arc<EventBus>>,
    period: Duration,
    ingest_delay: Duration,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller holds the state lock.
    fn publish(&self, frame: DetectionFrame) {
        let frame = Arc::new(frame);
        self.tx.send_replace(Arc::clone(&frame));
        if let Some(bus) = &self.bus {
            bus.publish(DashboardEvent::Detections(frame));
        }
    }

    fn tick(&self, epoch: u64) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        let State { feed, rng, .. } = &mut *state;
        match feed.advance(rng) {
            Some(frame) => {
                let frame = frame.clone();
                self.publish(frame);
                true
            }
            None => false,
        }
    }
}

/// Owner of the detection overlay.
///
/// Cheap to clone; clones share the same feed.
#[derive(Clone)]
pub struct DetectionSimulator {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DetectionSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionSimulator").finish_non_exhaustive()
    }
}

impl DetectionSimulator {
    /// A zero jitter period is rejected; a zero ingest delay resolves on the
    /// next scheduler turn.
    pub fn new(
        period: Duration,
        ingest_delay: Duration,
        rng: SimRng,
        bus: Option<Arc<EventBus>>,
    ) -> Result<Self, CoreError> {
        if period.is_zero() {
            return Err(CoreError::Validation("detection period must be positive".into()));
        }
        let (tx, _) = watch::channel(Arc::new(DetectionFrame::idle()));
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    epoch: 0,
                    feed: DetectionFeed::default(),
                    rng,
                    active: None,
                }),
                tx,
                bus,
                period,
                ingest_delay,
            }),
        })
    }

    /// Arm or disarm the feed.
    ///
    /// Arming populates the stable set at base values and starts the jitter
    /// ticker; arming again resets to base. Disarming empties the set, and
    /// no tick from the previous run writes after this returns. Must be
    /// called from within a tokio runtime.
    pub fn toggle(&self, running: bool) -> DetectionState {
        let mut state = self.shared.lock();
        state.epoch += 1;
        if let Some(previous) = state.active.take() {
            previous.cancel();
        }

        let frame = state.feed.toggle(running).clone();
        let new_state = frame.state;
        self.shared.publish(frame);
        if let Some(bus) = &self.shared.bus {
            bus.publish(DashboardEvent::DetectionState { state: new_state });
        }

        if running {
            let cancel = CancellationToken::new();
            state.active = Some(cancel.clone());
            tokio::spawn(run_ticker(Arc::clone(&self.shared), state.epoch, cancel));
        }
        tracing::info!(state = ?new_state, epoch = state.epoch, "Detection feed toggled");
        new_state
    }

    pub fn state(&self) -> DetectionState {
        self.shared.tx.borrow().state
    }

    /// Current immutable frame.
    pub fn detections(&self) -> Arc<DetectionFrame> {
        self.shared.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DetectionFrame>> {
        self.shared.tx.subscribe()
    }

    /// Run the simulated analysis over an uploaded image.
    ///
    /// The bytes are not inspected beyond a header sniff. Resolves after the
    /// configured delay with the stable set, confidences perturbed once and
    /// boxes at base. Leaves the live feed alone.
    pub async fn ingest_image(&self, bytes: impl AsRef<[u8]>) -> DetectionResult {
        let bytes = bytes.as_ref();
        let image = sniff_image(bytes);
        tracing::info!(
            size = bytes.len(),
            format = image.as_ref().map(|i| i.format.as_str()).unwrap_or("unknown"),
            "Ingesting image",
        );

        tokio::time::sleep(self.shared.ingest_delay).await;

        let detections = {
            let mut state = self.shared.lock();
            jittered_set(&mut state.rng, &INGEST_JITTER)
        };
        let result = DetectionResult {
            detections,
            image,
            completed_at: Utc::now(),
        };

        if let Some(bus) = &self.shared.bus {
            bus.publish(DashboardEvent::ImageIngested {
                detections: result.detections.len(),
                average_confidence: result.average_confidence(),
                format: result.image.as_ref().map(|i| i.format.clone()),
            });
        }
        tracing::info!(
            detections = result.detections.len(),
            average_confidence = result.average_confidence(),
            "Image analysis complete",
        );
        result
    }

    /// Pull one frame from a live source. Simulator state is untouched.
    pub fn capture_frame(&self, source: &dyn FrameSource) -> Option<Frame> {
        match source.capture() {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!(error = %e, "Frame capture failed");
                None
            }
        }
    }
}

async fn run_ticker(shared: Arc<Shared>, epoch: u64, cancel: CancellationToken) {
    let period = shared.period;
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if !shared.tick(epoch) {
                    break;
                }
            }
        }
    }
    tracing::debug!(epoch, "Detection ticker exited");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
