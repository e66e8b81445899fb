//! Safety-equipment detection catalog and the simulated detection feed.
//!
//! The feed always reports the same six stable objects. While armed, each
//! tick re-derives confidence and position from the object's *base* values
//! plus a small jitter, so nothing drifts over a long session.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DetectionId, Timestamp};

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Safety-equipment categories the detector knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SafetyClass {
    #[serde(rename = "Fire Extinguisher")]
    FireExtinguisher,
    #[serde(rename = "Oxygen Tank")]
    OxygenTank,
    #[serde(rename = "First Aid Box")]
    FirstAidBox,
    #[serde(rename = "Safety Switch")]
    SafetySwitch,
    #[serde(rename = "Emergency Phone")]
    EmergencyPhone,
    #[serde(rename = "Fire Alarm")]
    FireAlarm,
    #[serde(rename = "Nitrogen Tank")]
    NitrogenTank,
}

impl SafetyClass {
    pub const ALL: [SafetyClass; 7] = [
        SafetyClass::FireExtinguisher,
        SafetyClass::OxygenTank,
        SafetyClass::FirstAidBox,
        SafetyClass::SafetySwitch,
        SafetyClass::EmergencyPhone,
        SafetyClass::FireAlarm,
        SafetyClass::NitrogenTank,
    ];

    /// Human-readable label, as rendered on detection overlays.
    pub fn label(self) -> &'static str {
        match self {
            SafetyClass::FireExtinguisher => "Fire Extinguisher",
            SafetyClass::OxygenTank => "Oxygen Tank",
            SafetyClass::FirstAidBox => "First Aid Box",
            SafetyClass::SafetySwitch => "Safety Switch",
            SafetyClass::EmergencyPhone => "Emergency Phone",
            SafetyClass::FireAlarm => "Fire Alarm",
            SafetyClass::NitrogenTank => "Nitrogen Tank",
        }
    }
}

impl fmt::Display for SafetyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SafetyClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SafetyClass::ALL
            .into_iter()
            .find(|class| class.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::Validation(format!("unknown safety class '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Stable catalog
// ---------------------------------------------------------------------------

/// A catalog object with the base values jitter is applied around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableDetection {
    pub id: DetectionId,
    pub class: SafetyClass,
    pub base_confidence: f64,
    pub base_x: f64,
    pub base_y: f64,
    pub width: f64,
    pub height: f64,
}

pub const STABLE_DETECTIONS: [StableDetection; 6] = [
    StableDetection {
        id: 1,
        class: SafetyClass::FireExtinguisher,
        base_confidence: 0.94,
        base_x: 120.0,
        base_y: 80.0,
        width: 80.0,
        height: 120.0,
    },
    StableDetection {
        id: 2,
        class: SafetyClass::OxygenTank,
        base_confidence: 0.87,
        base_x: 300.0,
        base_y: 150.0,
        width: 60.0,
        height: 100.0,
    },
    StableDetection {
        id: 3,
        class: SafetyClass::FirstAidBox,
        base_confidence: 0.92,
        base_x: 450.0,
        base_y: 200.0,
        width: 70.0,
        height: 50.0,
    },
    StableDetection {
        id: 4,
        class: SafetyClass::SafetySwitch,
        base_confidence: 0.89,
        base_x: 200.0,
        base_y: 300.0,
        width: 40.0,
        height: 60.0,
    },
    StableDetection {
        id: 5,
        class: SafetyClass::EmergencyPhone,
        base_confidence: 0.85,
        base_x: 380.0,
        base_y: 120.0,
        width: 45.0,
        height: 65.0,
    },
    StableDetection {
        id: 6,
        class: SafetyClass::FireAlarm,
        base_confidence: 0.91,
        base_x: 500.0,
        base_y: 80.0,
        width: 35.0,
        height: 40.0,
    },
];

/// Jitter applied around base values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterBounds {
    /// Maximum absolute confidence offset.
    pub confidence: f64,
    /// Maximum absolute offset on each of `x` and `y`.
    pub position: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
}

/// Per-tick jitter while the feed is armed.
pub const LIVE_JITTER: JitterBounds = JitterBounds {
    confidence: 0.025,
    position: 1.5,
    min_confidence: 0.75,
    max_confidence: 0.98,
};

/// One-time confidence offset for an ingested image; boxes stay at base.
/// Only the probability range bounds the result, so a high base can land
/// above the live ceiling.
pub const INGEST_JITTER: JitterBounds = JitterBounds {
    confidence: 0.05,
    position: 0.0,
    min_confidence: 0.0,
    max_confidence: 1.0,
};

fn symmetric<R: Rng>(rng: &mut R, half_width: f64) -> f64 {
    if half_width > 0.0 {
        rng.random_range(-half_width..=half_width)
    } else {
        0.0
    }
}

impl StableDetection {
    pub fn at_base(&self) -> DetectionInstance {
        DetectionInstance {
            id: self.id,
            class: self.class,
            confidence: self.base_confidence,
            x: self.base_x,
            y: self.base_y,
            width: self.width,
            height: self.height,
        }
    }

    /// Base values plus jitter. Never depends on any previous tick.
    pub fn jittered<R: Rng>(&self, rng: &mut R, jitter: &JitterBounds) -> DetectionInstance {
        let confidence = (self.base_confidence + symmetric(rng, jitter.confidence))
            .clamp(jitter.min_confidence, jitter.max_confidence);
        DetectionInstance {
            confidence,
            x: self.base_x + symmetric(rng, jitter.position),
            y: self.base_y + symmetric(rng, jitter.position),
            ..self.at_base()
        }
    }
}

/// One bounding box as handed to the view layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionInstance {
    pub id: DetectionId,
    pub class: SafetyClass,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub fn base_set() -> Vec<DetectionInstance> {
    STABLE_DETECTIONS.iter().map(StableDetection::at_base).collect()
}

pub fn jittered_set<R: Rng>(rng: &mut R, jitter: &JitterBounds) -> Vec<DetectionInstance> {
    STABLE_DETECTIONS
        .iter()
        .map(|d| d.jittered(rng, jitter))
        .collect()
}

/// Mean confidence, or 0 for an empty set.
pub fn average_confidence(detections: &[DetectionInstance]) -> f64 {
    if detections.is_empty() {
        return 0.0;
    }
    detections.iter().map(|d| d.confidence).sum::<f64>() / detections.len() as f64
}

// ---------------------------------------------------------------------------
// Feed state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionState {
    Idle,
    Armed,
}

/// Immutable snapshot of the detection overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Ticks since the feed was last armed; 0 right after arming.
    pub tick: u64,
    pub state: DetectionState,
    pub detections: Vec<DetectionInstance>,
    pub captured_at: Timestamp,
}

impl DetectionFrame {
    pub fn idle() -> Self {
        Self {
            tick: 0,
            state: DetectionState::Idle,
            detections: Vec::new(),
            captured_at: Utc::now(),
        }
    }

    pub fn average_confidence(&self) -> f64 {
        average_confidence(&self.detections)
    }
}

/// `Idle`/`Armed` detection feed.
///
/// Transitions happen only through [`toggle`](DetectionFeed::toggle).
#[derive(Debug, Clone)]
pub struct DetectionFeed {
    frame: DetectionFrame,
    jitter: JitterBounds,
}

impl DetectionFeed {
    pub fn new(jitter: JitterBounds) -> Self {
        Self {
            frame: DetectionFrame::idle(),
            jitter,
        }
    }

    pub fn state(&self) -> DetectionState {
        self.frame.state
    }

    pub fn frame(&self) -> &DetectionFrame {
        &self.frame
    }

    /// Arm (populate the stable set at base values) or disarm (empty it).
    ///
    /// Arming an already armed feed resets every instance to base.
    pub fn toggle(&mut self, running: bool) -> &DetectionFrame {
        self.frame = if running {
            DetectionFrame {
                tick: 0,
                state: DetectionState::Armed,
                detections: base_set(),
                captured_at: Utc::now(),
            }
        } else {
            DetectionFrame::idle()
        };
        &self.frame
    }

    /// Jitter every instance around its base. Returns `None` while idle.
    pub fn advance<R: Rng>(&mut self, rng: &mut R) -> Option<&DetectionFrame> {
        if self.frame.state == DetectionState::Idle {
            return None;
        }
        self.frame = DetectionFrame {
            tick: self.frame.tick + 1,
            state: DetectionState::Armed,
            detections: jittered_set(rng, &self.jitter),
            captured_at: Utc::now(),
        };
        Some(&self.frame)
    }
}

impl Default for DetectionFeed {
    fn default() -> Self {
        Self::new(LIVE_JITTER)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
