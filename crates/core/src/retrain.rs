//! Simulated synthetic-data generation and model retraining.
//!
//! Nothing is trained. A run's outcome is drawn from ranges that look like
//! the historical log so the dashboard has something plausible to append.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::training::{MetricDelta, RunMetrics, RunStatus, TrainingRun};
use crate::detection::SafetyClass;

/// Augmentations every synthetic batch claims to apply.
pub const SYNTHETIC_VARIATIONS: [&str; 4] = ["lighting", "rotation", "occlusion", "noise"];

pub const RETRAIN_LEARNING_RATE: f64 = 0.001;

/// mAP ceiling a retrain can reach.
pub const MAX_MAP: f64 = 99.0;

const FAILED_RUN_DURATION_SECS: u64 = 3 * 60 + 15;
const INSUFFICIENT_DATA: &str = "Insufficient synthetic data generated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticBatch {
    pub class: SafetyClass,
    pub samples: u32,
    pub variations: Vec<String>,
    /// Simulated generation time, seconds.
    pub generation_secs: f64,
}

pub fn generate_synthetic_data<R: Rng>(rng: &mut R, class: SafetyClass, samples: u32) -> SyntheticBatch {
    SyntheticBatch {
        class,
        samples,
        variations: SYNTHETIC_VARIATIONS.iter().map(|v| v.to_string()).collect(),
        generation_secs: rng.random_range(2.5..=8.3),
    }
}

/// Produce the outcome of retraining on `batch`, starting from
/// `previous_map`.
///
/// An empty batch yields a failed run. The returned run has id 0; the
/// training log assigns the real id on record.
pub fn simulate_retrain<R: Rng>(
    rng: &mut R,
    previous_map: f64,
    batch: &SyntheticBatch,
    trigger: &str,
) -> TrainingRun {
    let timestamp = Utc::now();

    if batch.samples == 0 {
        return TrainingRun {
            id: 0,
            timestamp,
            status: RunStatus::Failed,
            trigger: trigger.to_string(),
            duration_secs: FAILED_RUN_DURATION_SECS,
            improvement: 0.0,
            metrics: None,
            error: Some(INSUFFICIENT_DATA.to_string()),
            synthetic_samples: 0,
            epochs: 0,
            learning_rate: RETRAIN_LEARNING_RATE,
        };
    }

    let drawn: f64 = rng.random_range(1.0..=4.0);
    let new_map = (previous_map + drawn).min(MAX_MAP);

    let mut paired = |lo: f64, hi: f64| {
        let after: f64 = rng.random_range(lo..=hi);
        let before = (after - rng.random_range(1.0..=3.5)).max(0.0);
        MetricDelta::new(before, after)
    };
    let precision = paired(88.0, 96.0);
    let recall = paired(85.0, 94.0);
    let f1_score = paired(87.0, 95.0);

    TrainingRun {
        id: 0,
        timestamp,
        status: RunStatus::Completed,
        trigger: trigger.to_string(),
        duration_secs: rng.random_range(600..=1200),
        improvement: (new_map - previous_map).max(0.0),
        metrics: Some(RunMetrics {
            map: MetricDelta::new(previous_map, new_map),
            precision,
            recall,
            f1_score,
        }),
        error: None,
        synthetic_samples: batch.samples,
        epochs: rng.random_range(15..=25),
        learning_rate: RETRAIN_LEARNING_RATE,
    }
}
