//! Window and peripheral sampling interfaces.
//!
//! The agent core consumes immutable snapshot values; it never talks to
//! the OS itself. Platform integrations implement [`WindowSampler`] and
//! [`PeripheralUsageProbe`] and plug in at composition time. The no-op
//! implementations let the crate compile and run on hosts without a
//! platform backend.

pub mod noop;
pub mod types;

// Re-export commonly used types
pub use noop::{NoopProbe, NoopSampler};
pub use types::{IoSample, MemorySample, ProcessSnapshot, WindowSnapshot};

use std::collections::HashSet;

/// Which peripheral a probe query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralKind {
    /// Audio playback sessions.
    Media,
    /// Audio capture sessions.
    Microphone,
}

/// Process sets with an active session on one peripheral.
#[derive(Debug, Clone, Default)]
pub struct PeripheralActivity {
    /// Processes with an active session.
    pub pids: HashSet<u32>,
    /// Parents of those processes. A window whose pids match here is
    /// sharing the peripheral with a descendant process.
    pub parent_pids: HashSet<u32>,
}

/// Enumerates on-screen windows and their process metadata.
pub trait WindowSampler: Send + Sync {
    /// Capture one batch of window snapshots.
    ///
    /// Processes that disappear mid-enumeration are filtered out by the
    /// implementation; a window with zero processes is a valid shape.
    fn capture_once(&self) -> Result<Vec<WindowSnapshot>, SampleError>;
}

/// Reports which processes currently hold an active peripheral session.
pub trait PeripheralUsageProbe: Send + Sync {
    fn active_processes(&self, kind: PeripheralKind) -> Result<PeripheralActivity, SampleError>;
}

/// Errors from platform sampling backends.
#[derive(Debug)]
pub enum SampleError {
    /// No platform backend is available on this host.
    Unsupported,
    /// The backend failed to enumerate windows or sessions.
    Backend(String),
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Unsupported => write!(f, "no sampling backend on this platform"),
            SampleError::Backend(e) => write!(f, "sampling backend error: {e}"),
        }
    }
}

impl std::error::Error for SampleError {}
