//! Model retraining history.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::{RunId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
    Running,
}

/// A metric measured before and after a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub before: f64,
    pub after: f64,
}

impl MetricDelta {
    pub const fn new(before: f64, after: f64) -> Self {
        Self { before, after }
    }

    pub fn gain(&self) -> f64 {
        self.after - self.before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    #[serde(rename = "mAP")]
    pub map: MetricDelta,
    pub precision: MetricDelta,
    pub recall: MetricDelta,
    pub f1_score: MetricDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRun {
    pub id: RunId,
    pub timestamp: Timestamp,
    pub status: RunStatus,
    /// What started the run, e.g. `Scheduled Retraining`.
    pub trigger: String,
    pub duration_secs: u64,
    /// mAP gain in percentage points.
    pub improvement: f64,
    /// Absent for failed runs.
    pub metrics: Option<RunMetrics>,
    pub error: Option<String>,
    pub synthetic_samples: u32,
    pub epochs: u32,
    pub learning_rate: f64,
}

impl TrainingRun {
    /// `12m 34s` style label.
    pub fn duration_label(&self) -> String {
        format!("{}m {}s", self.duration_secs / 60, self.duration_secs % 60)
    }
}

struct RunSeed {
    id: RunId,
    hours_ago: i64,
    status: RunStatus,
    trigger: &'static str,
    duration_secs: u64,
    improvement: f64,
    metrics: Option<RunMetrics>,
    error: Option<&'static str>,
    synthetic_samples: u32,
    epochs: u32,
    learning_rate: f64,
}

const RUN_SEEDS: [RunSeed; 4] = [
    RunSeed {
        id: 1,
        hours_ago: 2,
        status: RunStatus::Completed,
        trigger: "Low Confidence Alert",
        duration_secs: 12 * 60 + 34,
        improvement: 2.3,
        metrics: Some(RunMetrics {
            map: MetricDelta::new(92.4, 94.7),
            precision: MetricDelta::new(89.2, 91.8),
            recall: MetricDelta::new(87.6, 90.1),
            f1_score: MetricDelta::new(88.4, 90.9),
        }),
        error: None,
        synthetic_samples: 1250,
        epochs: 15,
        learning_rate: 0.001,
    },
    RunSeed {
        id: 2,
        hours_ago: 6,
        status: RunStatus::Completed,
        trigger: "Scheduled Retraining",
        duration_secs: 18 * 60 + 42,
        improvement: 1.8,
        metrics: Some(RunMetrics {
            map: MetricDelta::new(90.6, 92.4),
            precision: MetricDelta::new(87.8, 89.2),
            recall: MetricDelta::new(85.9, 87.6),
            f1_score: MetricDelta::new(86.8, 88.4),
        }),
        error: None,
        synthetic_samples: 2100,
        epochs: 20,
        learning_rate: 0.0008,
    },
    RunSeed {
        id: 3,
        hours_ago: 24,
        status: RunStatus::Failed,
        trigger: "Manual Trigger",
        duration_secs: 3 * 60 + 15,
        improvement: 0.0,
        metrics: None,
        error: Some("Insufficient synthetic data generated"),
        synthetic_samples: 0,
        epochs: 0,
        learning_rate: 0.001,
    },
    RunSeed {
        id: 4,
        hours_ago: 48,
        status: RunStatus::Completed,
        trigger: "Drift Detection",
        duration_secs: 15 * 60 + 28,
        improvement: 3.1,
        metrics: Some(RunMetrics {
            map: MetricDelta::new(87.5, 90.6),
            precision: MetricDelta::new(84.2, 87.8),
            recall: MetricDelta::new(82.8, 85.9),
            f1_score: MetricDelta::new(83.5, 86.8),
        }),
        error: None,
        synthetic_samples: 1800,
        epochs: 18,
        learning_rate: 0.0012,
    },
];

pub fn seed_runs(now: Timestamp) -> Vec<TrainingRun> {
    RUN_SEEDS
        .iter()
        .map(|seed| TrainingRun {
            id: seed.id,
            timestamp: now - Duration::hours(seed.hours_ago),
            status: seed.status,
            trigger: seed.trigger.to_string(),
            duration_secs: seed.duration_secs,
            improvement: seed.improvement,
            metrics: seed.metrics,
            error: seed.error.map(str::to_string),
            synthetic_samples: seed.synthetic_samples,
            epochs: seed.epochs,
            learning_rate: seed.learning_rate,
        })
        .collect()
}

/// Newest-first training history held by one dashboard.
///
/// Recorded runs are kept in memory only.
#[derive(Debug, Clone)]
pub struct TrainingLog {
    runs: Vec<TrainingRun>,
}

impl TrainingLog {
    pub fn new(now: Timestamp) -> Self {
        Self { runs: seed_runs(now) }
    }

    pub fn runs(&self) -> &[TrainingRun] {
        &self.runs
    }

    /// Runs with the given status, or all runs for `None`.
    pub fn filter(&self, status: Option<RunStatus>) -> Vec<&TrainingRun> {
        self.runs
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect()
    }

    /// Most recent completed run with metrics.
    pub fn latest_completed(&self) -> Option<&TrainingRun> {
        self.runs
            .iter()
            .filter(|r| r.status == RunStatus::Completed && r.metrics.is_some())
            .max_by_key(|r| r.timestamp)
    }

    /// Append a run as the newest entry, assigning it the next id.
    pub fn record(&mut self, mut run: TrainingRun) -> &TrainingRun {
        run.id = self.runs.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        self.runs.insert(0, run);
        &self.runs[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn seed_log_has_four_runs_newest_first() {
        let log = TrainingLog::new(Utc::now());
        let ids: Vec<RunId> = log.runs().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(log.runs().windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[test]
    fn filter_by_status() {
        let log = TrainingLog::new(Utc::now());
        assert_eq!(log.filter(None).len(), 4);
        assert_eq!(log.filter(Some(RunStatus::Completed)).len(), 3);

        let failed = log.filter(Some(RunStatus::Failed));
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error.as_deref(), Some("Insufficient synthetic data generated"));
        assert!(failed[0].metrics.is_none());

        assert!(log.filter(Some(RunStatus::Running)).is_empty());
    }

    #[test]
    fn duration_label_matches_dashboard_format() {
        let log = TrainingLog::new(Utc::now());
        assert_eq!(log.runs()[0].duration_label(), "12m 34s");
        assert_eq!(log.runs()[2].duration_label(), "3m 15s");
    }

    #[test]
    fn record_prepends_with_next_id() {
        let now = Utc::now();
        let mut log = TrainingLog::new(now);
        let mut run = log.runs()[0].clone();
        run.timestamp = now;
        run.trigger = "Manual Trigger".into();

        let recorded = log.record(run);
        assert_eq!(recorded.id, 5);
        assert_eq!(log.runs().len(), 5);
        assert_eq!(log.runs()[0].id, 5);
        assert_eq!(log.latest_completed().map(|r| r.id), Some(5));
    }

    #[test]
    fn metric_gain() {
        let log = TrainingLog::new(Utc::now());
        let metrics = log.runs()[0].metrics.expect("completed run has metrics");
        assert!((metrics.map.gain() - 2.3).abs() < 1e-9);
    }

    #[test]
    fn map_serializes_with_dashboard_key() {
        let log = TrainingLog::new(Utc::now());
        let json = serde_json::to_value(&log.runs()[0]).expect("serialize");
        assert_eq!(json["metrics"]["mAP"]["after"], 94.7);
        assert_eq!(json["status"], "completed");
    }
}
