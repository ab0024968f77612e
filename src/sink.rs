//! Hand-off of completed aggregate batches to durable storage.
//!
//! Persistence itself (schema, transactions) lives behind the
//! [`AggregateSink`] trait. The engine calls `store` once per non-empty
//! cycle, outside any lock, and never retries a failed batch.

use crate::aggregate::WindowAggregate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// One completed aggregation cycle, stored as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateBatch {
    pub windows: HashMap<u64, WindowAggregate>,
    /// Whether any keyboard or mouse event occurred during the cycle.
    pub initiative_use: bool,
    pub host: String,
    pub agent_id: Uuid,
    pub stored_at: DateTime<Utc>,
}

/// Destination for completed aggregate batches.
pub trait AggregateSink: Send + Sync {
    fn store(&self, batch: &AggregateBatch) -> Result<(), SinkError>;
}

/// Errors surfaced by a sink.
#[derive(Debug)]
pub enum SinkError {
    Io(String),
    Serialize(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "sink IO error: {e}"),
            SinkError::Serialize(e) => write!(f, "sink serialize error: {e}"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Appends each batch as one JSON line to a file.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AggregateSink for JsonlSink {
    fn store(&self, batch: &AggregateBatch) -> Result<(), SinkError> {
        let line =
            serde_json::to_string(batch).map_err(|e| SinkError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SinkError::Io(e.to_string()))?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SinkError::Io(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| SinkError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Retains batches in memory. Used by tests and demos.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<AggregateBatch>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every stored batch, in arrival order.
    pub fn batches(&self) -> Vec<AggregateBatch> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AggregateBatch>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AggregateSink for MemorySink {
    fn store(&self, batch: &AggregateBatch) -> Result<(), SinkError> {
        self.lock().push(batch.clone());
        Ok(())
    }
}
