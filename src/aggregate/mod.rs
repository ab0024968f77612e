//! Streaming aggregation of window snapshots into per-window,
//! per-minute-bucket statistics.

pub mod engine;
pub mod types;

// Re-export commonly used types
pub use engine::{AggregationEngine, CycleSummary};
pub use types::{minute_bucket, IoTotal, MemoryAverage, ProcessAggregate, WindowAggregate};
