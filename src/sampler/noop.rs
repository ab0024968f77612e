//! No-op sampler and probe implementations.
//!
//! These exist so the crate (and binary) can compile and run on hosts
//! without a platform window/audio backend. They observe nothing.

use crate::sampler::{
    PeripheralActivity, PeripheralKind, PeripheralUsageProbe, SampleError, WindowSampler,
    WindowSnapshot,
};

/// A sampler that never observes any windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSampler;

impl WindowSampler for NoopSampler {
    fn capture_once(&self) -> Result<Vec<WindowSnapshot>, SampleError> {
        Ok(Vec::new())
    }
}

/// A probe that never reports any active peripheral sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProbe;

impl PeripheralUsageProbe for NoopProbe {
    fn active_processes(&self, _kind: PeripheralKind) -> Result<PeripheralActivity, SampleError> {
        Ok(PeripheralActivity::default())
    }
}
