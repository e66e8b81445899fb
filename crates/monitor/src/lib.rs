//! Async runtime side of the AR safety monitor.
//!
//! The simulators here own the timers; the domain logic they drive lives in
//! `arsafety-core`. [`dashboard::Dashboard`] wires everything together for
//! one signed-in view.

pub mod camera;
pub mod config;
pub mod dashboard;
pub mod detection;
pub mod metrics;
pub mod view;

pub use config::MonitorConfig;
pub use dashboard::Dashboard;
pub use detection::{DetectionResult, DetectionSimulator};
pub use metrics::{MetricsHandle, MetricsSimulator};
