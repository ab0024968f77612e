//! The per-cycle merge: drain both buffers, fold, hand off to the sink.

use crate::aggregate::types::WindowAggregate;
use crate::buffer::SampleBuffer;
use crate::input::InputActivityTracker;
use crate::sink::{AggregateBatch, AggregateSink, SinkError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of one non-empty aggregation cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleSummary {
    pub snapshots: usize,
    pub windows: usize,
    pub input_events: u64,
    pub initiative_use: bool,
}

/// Folds drained snapshots and input counters into window aggregates and
/// forwards each completed batch to the sink.
///
/// The engine keeps no aggregation state across cycles: the aggregate
/// map is built locally inside [`merge_cycle`](Self::merge_cycle) and
/// moves wholesale into the batch. Drains swap shared containers under a
/// short critical section; all fold work and the sink call happen on
/// private data.
pub struct AggregationEngine {
    buffer: Arc<SampleBuffer>,
    tracker: Arc<InputActivityTracker>,
    sink: Arc<dyn AggregateSink>,
    /// Seconds credited to a usage-time field per flagged sample.
    sample_secs: f64,
    agent_id: Uuid,
    host: String,
}

impl AggregationEngine {
    pub fn new(
        buffer: Arc<SampleBuffer>,
        tracker: Arc<InputActivityTracker>,
        sink: Arc<dyn AggregateSink>,
        sample_secs: f64,
    ) -> Self {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            buffer,
            tracker,
            sink,
            sample_secs,
            agent_id: Uuid::new_v4(),
            host,
        }
    }

    /// Instance id stamped on every batch this engine stores.
    pub fn agent_id(&self) -> Uuid {
        self.agent_id
    }

    /// Run one aggregation cycle.
    ///
    /// Returns `Ok(None)` when no snapshots were buffered: the cycle is
    /// skipped, nothing reaches the sink, and any input events drained
    /// alongside are discarded. A sink error means the cycle's batch is
    /// lost; the engine never retries.
    pub fn merge_cycle(&self) -> Result<Option<CycleSummary>, SinkError> {
        let batches = self.buffer.drain_and_reset();
        let (input_by_window, input_events) = self.tracker.drain_and_reset();

        // Snapshot emptiness gates the cycle, not input emptiness.
        if batches.is_empty() {
            debug!(input_events, "no snapshots buffered; skipping cycle");
            return Ok(None);
        }

        let initiative_use = input_events > 0;
        let mut windows: HashMap<u64, WindowAggregate> = HashMap::new();
        let mut snapshots = 0usize;

        for batch in &batches {
            for snapshot in batch {
                snapshots += 1;
                windows
                    .entry(snapshot.window_id)
                    .or_insert_with(|| {
                        WindowAggregate::first_observed(
                            snapshot,
                            input_by_window.get(&snapshot.window_id),
                        )
                    })
                    .fold(snapshot, self.sample_secs);
            }
        }

        let summary = CycleSummary {
            snapshots,
            windows: windows.len(),
            input_events,
            initiative_use,
        };

        let batch = AggregateBatch {
            windows,
            initiative_use,
            host: self.host.clone(),
            agent_id: self.agent_id,
            stored_at: Utc::now(),
        };
        self.sink.store(&batch)?;
        info!(
            snapshots,
            windows = summary.windows,
            input_events,
            initiative_use,
            "cycle merged and stored"
        );
        Ok(Some(summary))
    }
}
