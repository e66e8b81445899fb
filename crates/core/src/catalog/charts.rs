//! Fixed chart series for the analytics panel.

use serde::Serialize;

use crate::detection::SafetyClass;

/// One point of the 24h accuracy/confidence trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub time: &'static str,
    pub accuracy: f64,
    pub confidence: f64,
}

pub const ACCURACY_TREND: [TrendPoint; 7] = [
    TrendPoint { time: "00:00", accuracy: 94.2, confidence: 85.1 },
    TrendPoint { time: "04:00", accuracy: 95.1, confidence: 87.3 },
    TrendPoint { time: "08:00", accuracy: 94.8, confidence: 86.9 },
    TrendPoint { time: "12:00", accuracy: 95.7, confidence: 88.2 },
    TrendPoint { time: "16:00", accuracy: 95.3, confidence: 87.8 },
    TrendPoint { time: "20:00", accuracy: 95.9, confidence: 89.1 },
    TrendPoint { time: "24:00", accuracy: 95.7, confidence: 87.3 },
];

/// Per-class detection count with mean confidence (percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassCount {
    #[serde(rename = "object")]
    pub class: SafetyClass,
    pub count: u32,
    pub confidence: f64,
}

pub const CLASS_COUNTS: [ClassCount; 5] = [
    ClassCount { class: SafetyClass::FireExtinguisher, count: 24, confidence: 94.2 },
    ClassCount { class: SafetyClass::OxygenTank, count: 18, confidence: 87.3 },
    ClassCount { class: SafetyClass::FirstAidBox, count: 12, confidence: 92.1 },
    ClassCount { class: SafetyClass::SafetySwitch, count: 8, confidence: 89.4 },
    ClassCount { class: SafetyClass::EmergencyPhone, count: 6, confidence: 91.7 },
];

/// Model-level performance figure (percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetric {
    pub name: &'static str,
    pub value: f64,
}

pub const PERFORMANCE_BREAKDOWN: [PerformanceMetric; 4] = [
    PerformanceMetric { name: "Precision", value: 95.7 },
    PerformanceMetric { name: "Recall", value: 92.3 },
    PerformanceMetric { name: "F1-Score", value: 93.9 },
    PerformanceMetric { name: "mAP@0.5", value: 94.1 },
];

/// Class counts ordered by mean confidence, best first.
pub fn classes_by_confidence() -> Vec<ClassCount> {
    let mut counts = CLASS_COUNTS.to_vec();
    counts.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    counts
}

pub fn total_class_detections() -> u32 {
    CLASS_COUNTS.iter().map(|c| c.count).sum()
}
