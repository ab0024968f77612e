//! Snapshot types produced by the platform sampler.
//!
//! A snapshot is an immutable point-in-time observation of one window,
//! its owning processes, and their resource counters. Snapshots are
//! produced at collection frequency, consumed by exactly one aggregation
//! drain, and discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time memory counters for one process. Bytes unless noted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    /// Share of physical memory, 0-100.
    pub percent: f64,
    pub rss: u64,
    pub vms: u64,
    pub peak_working_set: u64,
    pub page_faults: u64,
}

/// Point-in-time I/O counters for one process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoSample {
    pub read_calls: u64,
    pub write_calls: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// One observed process behind a window.
///
/// The sampler filters out processes that vanished between enumeration
/// and sampling, so every snapshot that reaches the core is a valid
/// observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub path: String,
    pub owner: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub memory: MemorySample,
    pub io: IoSample,
}

impl ProcessSnapshot {
    /// Create a snapshot with zeroed counters and empty identity fields.
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            path: String::new(),
            owner: String::new(),
            status: String::new(),
            started_at: None,
            memory: MemorySample::default(),
            io: IoSample::default(),
        }
    }
}

/// One observed window with its processes and peripheral flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub window_id: u64,
    pub title: String,
    pub captured_at: DateTime<Utc>,
    /// Whether this was the foreground window at capture time.
    pub is_foreground: bool,
    /// Process ids owning the window; the collection task intersects
    /// these with the peripheral probe's active sets.
    pub pids: Vec<u32>,
    pub processes: Vec<ProcessSnapshot>,
    pub media_in_use: bool,
    pub microphone_in_use: bool,
    /// Media session active in a descendant of an owning process.
    pub media_shared: bool,
    /// Microphone session active in a descendant of an owning process.
    pub microphone_shared: bool,
}

impl WindowSnapshot {
    /// Create a snapshot with no processes and all flags cleared.
    pub fn new(window_id: u64, title: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            window_id,
            title: title.into(),
            captured_at,
            is_foreground: false,
            pids: Vec::new(),
            processes: Vec::new(),
            media_in_use: false,
            microphone_in_use: false,
            media_shared: false,
            microphone_shared: false,
        }
    }
}
