//! Monitoring Module
//!
//! Decision counters and logging bootstrap.

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{EngineMetrics, MetricsSnapshot};
