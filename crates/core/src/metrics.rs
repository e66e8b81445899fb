//! Live telemetry snapshot and its bounded random walk.
//!
//! Each update adds a small uniform delta to the previous value and clamps
//! the result, so the numbers drift plausibly instead of being redrawn.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_ACCURACY: f64 = 95.7;
pub const DEFAULT_CONFIDENCE: f64 = 87.3;
pub const DEFAULT_FPS: f64 = 24.0;
pub const DEFAULT_OBJECTS_DETECTED: u32 = 12;
pub const DEFAULT_ALERTS_TODAY: u32 = 3;

// ---------------------------------------------------------------------------
// Walk bounds
// ---------------------------------------------------------------------------

/// Step size and clamp range for a continuous field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkBounds {
    /// Maximum absolute delta per update.
    pub step: f64,
    pub min: f64,
    pub max: f64,
}

impl WalkBounds {
    pub const fn new(step: f64, min: f64, max: f64) -> Self {
        Self { step, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Advance `value` by `uniform(-step, step)` and clamp.
    pub fn walk<R: Rng>(&self, value: f64, rng: &mut R) -> f64 {
        let delta = if self.step > 0.0 {
            rng.random_range(-self.step..=self.step)
        } else {
            0.0
        };
        (value + delta).clamp(self.min, self.max)
    }

    fn validate(&self, name: &str) -> Result<(), CoreError> {
        if !(self.step.is_finite() && self.min.is_finite() && self.max.is_finite()) {
            return Err(CoreError::Validation(format!("{name} bounds must be finite")));
        }
        if self.step < 0.0 {
            return Err(CoreError::Validation(format!(
                "{name} step must be non-negative, got {}",
                self.step
            )));
        }
        if self.min > self.max {
            return Err(CoreError::Validation(format!(
                "{name} min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Step size and clamp range for an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntWalkBounds {
    pub step: u32,
    pub min: u32,
    pub max: u32,
}

impl IntWalkBounds {
    pub const fn new(step: u32, min: u32, max: u32) -> Self {
        Self { step, min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Advance `value` by an integer in `[-step, step]` and clamp.
    pub fn walk<R: Rng>(&self, value: u32, rng: &mut R) -> u32 {
        let step = i64::from(self.step);
        let delta = rng.random_range(-step..=step);
        let next = (i64::from(value) + delta).clamp(i64::from(self.min), i64::from(self.max));
        // Clamped into the u32 range above.
        next as u32
    }

    fn validate(&self, name: &str) -> Result<(), CoreError> {
        if self.min > self.max {
            return Err(CoreError::Validation(format!(
                "{name} min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Per-field walk parameters for [`MetricsSnapshot::next`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsBounds {
    pub accuracy: WalkBounds,
    pub confidence: WalkBounds,
    pub fps: WalkBounds,
    pub objects_detected: IntWalkBounds,
}

impl MetricsBounds {
    pub const DASHBOARD: Self = Self {
        accuracy: WalkBounds::new(1.0, 90.0, 99.0),
        confidence: WalkBounds::new(1.5, 70.0, 95.0),
        fps: WalkBounds::new(1.0, 20.0, 30.0),
        objects_detected: IntWalkBounds::new(1, 8, 20),
    };

    pub fn validate(&self) -> Result<(), CoreError> {
        self.accuracy.validate("accuracy")?;
        self.confidence.validate("confidence")?;
        self.fps.validate("fps")?;
        self.objects_detected.validate("objects_detected")
    }
}

impl Default for MetricsBounds {
    fn default() -> Self {
        Self::DASHBOARD
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable point-in-time copy of the telemetry panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Number of walk steps since the last reset; 0 for the initial snapshot.
    pub tick: u64,
    /// Detection accuracy, percent.
    pub accuracy: f64,
    /// Mean confidence, percent.
    pub confidence: f64,
    /// Frames per second.
    pub fps: f64,
    pub objects_detected: u32,
    /// Not walked; fixed for the lifetime of the panel.
    pub alerts_today: u32,
    pub captured_at: Timestamp,
}

impl MetricsSnapshot {
    /// The values the dashboard shows before the first tick.
    pub fn initial() -> Self {
        Self {
            tick: 0,
            accuracy: DEFAULT_ACCURACY,
            confidence: DEFAULT_CONFIDENCE,
            fps: DEFAULT_FPS,
            objects_detected: DEFAULT_OBJECTS_DETECTED,
            alerts_today: DEFAULT_ALERTS_TODAY,
            captured_at: Utc::now(),
        }
    }

    /// Compute the next snapshot from this one.
    pub fn next<R: Rng>(&self, bounds: &MetricsBounds, rng: &mut R) -> Self {
        Self {
            tick: self.tick + 1,
            accuracy: bounds.accuracy.walk(self.accuracy, rng),
            confidence: bounds.confidence.walk(self.confidence, rng),
            fps: bounds.fps.walk(self.fps, rng),
            objects_detected: bounds.objects_detected.walk(self.objects_detected, rng),
            alerts_today: self.alerts_today,
            captured_at: Utc::now(),
        }
    }

    /// Successor snapshot with `accuracy` replaced (clamped), other fields
    /// carried over.
    pub fn with_accuracy(&self, accuracy: f64, bounds: &MetricsBounds) -> Self {
        Self {
            tick: self.tick + 1,
            accuracy: accuracy.clamp(bounds.accuracy.min, bounds.accuracy.max),
            captured_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn is_within(&self, bounds: &MetricsBounds) -> bool {
        bounds.accuracy.contains(self.accuracy)
            && bounds.confidence.contains(self.confidence)
            && bounds.fps.contains(self.fps)
            && bounds.objects_detected.contains(self.objects_detected)
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::sim_rng;

    #[test]
    fn initial_snapshot_matches_dashboard_defaults() {
        let s = MetricsSnapshot::initial();
        assert_eq!(s.tick, 0);
        assert_eq!(s.accuracy, 95.7);
        assert_eq!(s.confidence, 87.3);
        assert_eq!(s.fps, 24.0);
        assert_eq!(s.objects_detected, 12);
        assert_eq!(s.alerts_today, 3);
        assert!(s.is_within(&MetricsBounds::DASHBOARD));
    }

    #[test]
    fn thousand_ticks_stay_in_bounds() {
        let bounds = MetricsBounds::DASHBOARD;
        let mut rng = sim_rng(Some(42), 0);
        let mut snapshot = MetricsSnapshot::initial();

        for _ in 0..1000 {
            snapshot = snapshot.next(&bounds, &mut rng);
            assert!((90.0..=99.0).contains(&snapshot.accuracy), "accuracy {}", snapshot.accuracy);
            assert!((70.0..=95.0).contains(&snapshot.confidence), "confidence {}", snapshot.confidence);
            assert!((20.0..=30.0).contains(&snapshot.fps), "fps {}", snapshot.fps);
            assert!((8..=20).contains(&snapshot.objects_detected));
            assert_eq!(snapshot.alerts_today, DEFAULT_ALERTS_TODAY);
        }
        assert_eq!(snapshot.tick, 1000);
    }

    #[test]
    fn each_step_is_a_small_delta() {
        let bounds = MetricsBounds::DASHBOARD;
        let mut rng = sim_rng(Some(3), 0);
        let mut prev = MetricsSnapshot::initial();

        for _ in 0..500 {
            let next = prev.next(&bounds, &mut rng);
            assert!((next.accuracy - prev.accuracy).abs() <= 1.0 + 1e-9);
            assert!((next.confidence - prev.confidence).abs() <= 1.5 + 1e-9);
            assert!((next.fps - prev.fps).abs() <= 1.0 + 1e-9);
            assert!(next.objects_detected.abs_diff(prev.objects_detected) <= 1);
            prev = next;
        }
    }

    #[test]
    fn seeded_walks_are_reproducible() {
        let bounds = MetricsBounds::DASHBOARD;
        let mut a = sim_rng(Some(9), 0);
        let mut b = sim_rng(Some(9), 0);
        let start = MetricsSnapshot::initial();

        let x = start.next(&bounds, &mut a).next(&bounds, &mut a);
        let y = start.next(&bounds, &mut b).next(&bounds, &mut b);
        assert_eq!(x.accuracy, y.accuracy);
        assert_eq!(x.objects_detected, y.objects_detected);
    }

    #[test]
    fn with_accuracy_clamps() {
        let bounds = MetricsBounds::DASHBOARD;
        let s = MetricsSnapshot::initial().with_accuracy(120.0, &bounds);
        assert_eq!(s.accuracy, 99.0);
        assert_eq!(s.tick, 1);
        assert_eq!(s.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn zero_step_holds_value() {
        let b = WalkBounds::new(0.0, 0.0, 10.0);
        let mut rng = sim_rng(Some(1), 0);
        assert_eq!(b.walk(4.0, &mut rng), 4.0);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut bounds = MetricsBounds::DASHBOARD;
        bounds.fps = WalkBounds::new(1.0, 30.0, 20.0);
        assert!(bounds.validate().is_err());

        let mut bounds = MetricsBounds::DASHBOARD;
        bounds.accuracy.step = -1.0;
        assert!(bounds.validate().is_err());

        assert!(MetricsBounds::DASHBOARD.validate().is_ok());
    }
}
