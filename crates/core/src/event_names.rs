//! Canonical dashboard event names.
//!
//! Used as the `type` discriminator when events are serialized for the view
//! layer and as the `event_type` field in structured log lines.

/// A new metrics snapshot was produced by the telemetry walk.
pub const EVENT_METRICS_TICK: &str = "metrics.tick";

/// A new detection frame was produced (tick, arm or disarm).
pub const EVENT_DETECTION_FRAME: &str = "detection.frame";

/// The detection feed moved between `idle` and `armed`.
pub const EVENT_DETECTION_STATE: &str = "detection.state";

/// A simulated image ingestion resolved.
pub const EVENT_IMAGE_INGESTED: &str = "detection.ingested";

/// A user signed in.
pub const EVENT_SESSION_STARTED: &str = "session.started";

/// The active session was cleared.
pub const EVENT_SESSION_ENDED: &str = "session.ended";

/// A simulated retraining run was appended to the training log.
pub const EVENT_TRAINING_RECORDED: &str = "training.recorded";
