//! Read-only reference datasets consumed by the dashboard views.
//!
//! Only [`alerts::AlertBoard`] and [`training::TrainingLog`] hold mutable
//! working copies, and neither is persisted.

pub mod alerts;
pub mod charts;
pub mod heatmap;
pub mod training;

pub use alerts::{AlertBoard, AlertEntry, AlertKind};
pub use heatmap::{HeatmapPoint, IntensityBand};
pub use training::{RunStatus, TrainingLog, TrainingRun};
