//! Domain model for the AR safety monitoring dashboard.
//!
//! Everything in this crate is synchronous and free of I/O scheduling:
//!
//! - [`session`]: client-local login state with a pluggable durable backend.
//! - [`metrics`]: the bounded random walk behind the live telemetry panel.
//! - [`detection`]: the fixed safety-equipment catalog and its jitter model.
//! - [`catalog`]: read-only alert, heatmap, training and chart datasets.
//! - [`retrain`]: simulated synthetic-data generation and retraining runs.
//! - [`routing`]: the session gate in front of the dashboard destination.
//!
//! Timers, channels and the composition root live in `arsafety-monitor`.

pub mod catalog;
pub mod detection;
pub mod error;
pub mod event_names;
pub mod metrics;
pub mod random;
pub mod retrain;
pub mod routing;
pub mod session;
pub mod types;
