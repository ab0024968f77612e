//! Aggregate value types: cycle-scoped accumulations of many snapshots.
//!
//! Aggregates are keyed by `(window id, minute bucket)`, built
//! incrementally while a cycle's snapshots are folded in, and handed
//! wholesale to the sink at cycle end.

use crate::input::InputSample;
use crate::sampler::{IoSample, MemorySample, ProcessSnapshot, WindowSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Incrementally maintained arithmetic mean of memory samples.
///
/// Each `avg_*` field holds the mean of every sample folded so far;
/// `samples` is the fold count. Folding the same set of samples in any
/// order yields the same means.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryAverage {
    pub avg_percent: f64,
    pub avg_rss: f64,
    pub avg_vms: f64,
    pub avg_peak_working_set: f64,
    pub avg_page_faults: f64,
    pub samples: u64,
}

impl MemoryAverage {
    /// Fold one sample into the running means.
    pub fn fold(&mut self, sample: &MemorySample) {
        // First sample sets the means directly; no division by zero.
        if self.samples == 0 {
            self.avg_percent = sample.percent;
            self.avg_rss = sample.rss as f64;
            self.avg_vms = sample.vms as f64;
            self.avg_peak_working_set = sample.peak_working_set as f64;
            self.avg_page_faults = sample.page_faults as f64;
            self.samples = 1;
            return;
        }

        let prior = self.samples as f64;
        self.samples += 1;
        let count = self.samples as f64;
        self.avg_percent = (self.avg_percent * prior + sample.percent) / count;
        self.avg_rss = (self.avg_rss * prior + sample.rss as f64) / count;
        self.avg_vms = (self.avg_vms * prior + sample.vms as f64) / count;
        self.avg_peak_working_set =
            (self.avg_peak_working_set * prior + sample.peak_working_set as f64) / count;
        self.avg_page_faults = (self.avg_page_faults * prior + sample.page_faults as f64) / count;
    }
}

/// Running sums of I/O counters. Strictly additive, no decay, no cap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IoTotal {
    pub read_calls: u64,
    pub write_calls: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl IoTotal {
    /// Add one sample's counters to the totals.
    pub fn fold(&mut self, sample: &IoSample) {
        self.read_calls += sample.read_calls;
        self.write_calls += sample.write_calls;
        self.read_bytes += sample.read_bytes;
        self.write_bytes += sample.write_bytes;
    }
}

/// Cycle-scoped statistics for one process behind a window.
///
/// Identity fields are fixed by the first observation; later
/// observations only append a status and fold statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessAggregate {
    pub pid: u32,
    pub name: String,
    pub path: String,
    pub owner: String,
    pub started_at: Option<DateTime<Utc>>,
    /// Every status observed this cycle, in arrival order.
    pub statuses: Vec<String>,
    pub memory: MemoryAverage,
    pub io: IoTotal,
}

impl ProcessAggregate {
    fn first_observed(snapshot: &ProcessSnapshot) -> Self {
        Self {
            pid: snapshot.pid,
            name: snapshot.name.clone(),
            path: snapshot.path.clone(),
            owner: snapshot.owner.clone(),
            started_at: snapshot.started_at,
            statuses: Vec::new(),
            memory: MemoryAverage::default(),
            io: IoTotal::default(),
        }
    }

    /// Fold one observation. Identity fields are untouched.
    pub fn observe(&mut self, snapshot: &ProcessSnapshot) {
        self.statuses.push(snapshot.status.clone());
        self.memory.fold(&snapshot.memory);
        self.io.fold(&snapshot.io);
    }
}

/// Aggregated activity for one `(window, minute bucket)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowAggregate {
    /// Minute bucket label of the first contributing snapshot.
    pub bucket: String,
    pub window_id: u64,
    /// Distinct titles observed this cycle, in first-seen order.
    pub titles: Vec<String>,
    /// Start time of the window's first process, when known.
    pub started_at: Option<DateTime<Utc>>,
    /// Cumulative seconds as the foreground window.
    pub foreground_secs: f64,
    pub media_use_secs: f64,
    pub microphone_use_secs: f64,
    pub media_share_secs: f64,
    pub microphone_share_secs: f64,
    /// Keyboard/mouse counters folded in for this window.
    pub input: InputSample,
    pub processes: HashMap<u32, ProcessAggregate>,
}

impl WindowAggregate {
    /// Build an aggregate from the first contributing snapshot, folding
    /// the window's input sample exactly once.
    pub fn first_observed(snapshot: &WindowSnapshot, input: Option<&InputSample>) -> Self {
        let mut aggregate = Self {
            bucket: minute_bucket(snapshot.captured_at),
            window_id: snapshot.window_id,
            titles: Vec::new(),
            started_at: snapshot.processes.first().and_then(|p| p.started_at),
            foreground_secs: 0.0,
            media_use_secs: 0.0,
            microphone_use_secs: 0.0,
            media_share_secs: 0.0,
            microphone_share_secs: 0.0,
            input: InputSample::default(),
            processes: HashMap::new(),
        };
        if let Some(input) = input {
            aggregate.input.merge(input);
        }
        aggregate
    }

    /// Fold one snapshot into the aggregate. Each flagged peripheral
    /// adds `sample_secs` to its cumulative-time field.
    pub fn fold(&mut self, snapshot: &WindowSnapshot, sample_secs: f64) {
        if !self.titles.iter().any(|title| title == &snapshot.title) {
            self.titles.push(snapshot.title.clone());
        }
        if snapshot.is_foreground {
            self.foreground_secs += sample_secs;
        }
        if snapshot.media_in_use {
            self.media_use_secs += sample_secs;
        }
        if snapshot.microphone_in_use {
            self.microphone_use_secs += sample_secs;
        }
        if snapshot.media_shared {
            self.media_share_secs += sample_secs;
        }
        if snapshot.microphone_shared {
            self.microphone_share_secs += sample_secs;
        }
        for process in &snapshot.processes {
            self.processes
                .entry(process.pid)
                .or_insert_with(|| ProcessAggregate::first_observed(process))
                .observe(process);
        }
    }
}

/// Format a timestamp as its minute bucket label, e.g. "2026-08-30 14:07".
pub fn minute_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
