//! Activity Telemetry Agent - background window/process/input aggregation.
//!
//! This library samples the state of on-screen windows, their owning
//! processes, peripheral (audio/microphone) usage, and keyboard/mouse
//! activity, then folds the high-frequency samples into per-window,
//! per-minute aggregates for durable storage.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Activity Telemetry Agent                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  seconds   ┌──────────────┐                   │
//! │  │  Sampler  │──────────▶│ SampleBuffer  │──┐                │
//! │  │  + Probe  │  (tick)    └──────────────┘  │ drain          │
//! │  └───────────┘                              ▼ (minutes)      │
//! │  ┌───────────┐            ┌──────────────┐  ┌─────────────┐  │
//! │  │   Input   │──────────▶│InputActivity  │─▶│ Aggregation │  │
//! │  │  hooks    │ (callback) │   Tracker    │  │   Engine    │  │
//! │  └───────────┘            └──────────────┘  └──────┬──────┘  │
//! │                                                    ▼         │
//! │                                             ┌─────────────┐  │
//! │                                             │AggregateSink│  │
//! │                                             └─────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Producers only ever touch the two shared buffers under short
//! per-container locks; the engine drains both with a container swap and
//! does all merge work and sink I/O on private data.
//!
//! # Example
//!
//! ```no_run
//! use activity_telemetry_agent::{
//!     agent::Agent,
//!     config::Config,
//!     sampler::{NoopProbe, NoopSampler},
//!     sink::MemorySink,
//! };
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let mut agent = Agent::new(
//!     &config,
//!     Arc::new(NoopSampler),
//!     Arc::new(NoopProbe),
//!     Arc::new(MemorySink::new()),
//! );
//! agent.start().expect("scheduler already running");
//! ```

pub mod agent;
pub mod aggregate;
pub mod buffer;
pub mod config;
pub mod input;
pub mod sampler;
pub mod scheduler;
pub mod sink;

// Re-export key types at crate root for convenience
pub use agent::{Agent, CollectionTask};
pub use aggregate::{
    minute_bucket, AggregationEngine, CycleSummary, IoTotal, MemoryAverage, ProcessAggregate,
    WindowAggregate,
};
pub use buffer::SampleBuffer;
pub use config::{Config, ConfigError};
pub use input::{
    InputActivityTracker, InputEventSource, InputSample, InputSourceError, NoopInputSource,
};
pub use sampler::{
    IoSample, MemorySample, NoopProbe, NoopSampler, PeripheralActivity, PeripheralKind,
    PeripheralUsageProbe, ProcessSnapshot, SampleError, WindowSampler, WindowSnapshot,
};
pub use scheduler::{PeriodicScheduler, SchedulerError};
pub use sink::{AggregateBatch, AggregateSink, JsonlSink, MemorySink, SinkError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
