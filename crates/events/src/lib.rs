//! Dashboard event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DashboardEvent`]: the immutable envelope every simulator publishes.
//! - [`EventHistory`]: bounded recorder of recent events, the data source
//!   for live trend charts.

pub mod bus;
pub mod history;

pub use bus::{DashboardEvent, EventBus};
pub use history::EventHistory;
