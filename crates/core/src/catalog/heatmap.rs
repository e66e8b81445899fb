//! Spatial detection-frequency heatmap.

use serde::Serialize;

use crate::detection::SafetyClass;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapPoint {
    pub x: f64,
    pub y: f64,
    /// In `[0, 1]`.
    pub intensity: f64,
    #[serde(rename = "object")]
    pub class: SafetyClass,
    pub detections: u32,
}

pub const HEATMAP_POINTS: [HeatmapPoint; 7] = [
    HeatmapPoint { x: 120.0, y: 80.0, intensity: 0.9, class: SafetyClass::FireExtinguisher, detections: 45 },
    HeatmapPoint { x: 300.0, y: 150.0, intensity: 0.7, class: SafetyClass::OxygenTank, detections: 32 },
    HeatmapPoint { x: 450.0, y: 200.0, intensity: 0.8, class: SafetyClass::FirstAidBox, detections: 28 },
    HeatmapPoint { x: 200.0, y: 300.0, intensity: 0.6, class: SafetyClass::SafetySwitch, detections: 18 },
    HeatmapPoint { x: 350.0, y: 100.0, intensity: 0.5, class: SafetyClass::EmergencyPhone, detections: 12 },
    HeatmapPoint { x: 180.0, y: 180.0, intensity: 0.4, class: SafetyClass::FireAlarm, detections: 8 },
    HeatmapPoint { x: 400.0, y: 280.0, intensity: 0.3, class: SafetyClass::NitrogenTank, detections: 6 },
];

/// Points for one class, or all of them when `class` is `None`.
pub fn filter(class: Option<SafetyClass>) -> Vec<HeatmapPoint> {
    HEATMAP_POINTS
        .iter()
        .filter(|p| class.map_or(true, |c| p.class == c))
        .copied()
        .collect()
}

pub fn total_detections(points: &[HeatmapPoint]) -> u32 {
    points.iter().map(|p| p.detections).sum()
}

/// Mean intensity, or 0 for no points.
pub fn average_intensity(points: &[HeatmapPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.intensity).sum::<f64>() / points.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityBand {
    Low,
    Medium,
    High,
}

impl IntensityBand {
    pub fn of(intensity: f64) -> Self {
        if intensity > 0.7 {
            IntensityBand::High
        } else if intensity > 0.4 {
            IntensityBand::Medium
        } else {
            IntensityBand::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_returns_every_point() {
        let all = filter(None);
        assert_eq!(all.len(), 7);
        assert_eq!(total_detections(&all), 149);
        assert!((average_intensity(&all) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn filter_by_class() {
        let points = filter(Some(SafetyClass::OxygenTank));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].detections, 32);
        assert_eq!(IntensityBand::of(points[0].intensity), IntensityBand::Medium);
    }

    #[test]
    fn empty_selection_has_zero_average() {
        assert_eq!(average_intensity(&[]), 0.0);
        assert_eq!(total_detections(&[]), 0);
    }

    #[test]
    fn band_thresholds_are_exclusive() {
        assert_eq!(IntensityBand::of(0.9), IntensityBand::High);
        assert_eq!(IntensityBand::of(0.7), IntensityBand::Medium);
        assert_eq!(IntensityBand::of(0.4), IntensityBand::Low);
    }
}
