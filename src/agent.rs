//! Composition root: the collection task and scheduler wiring.
//!
//! The collection job (seconds period) captures window snapshots, marks
//! their peripheral flags from the probe's active sets, and buffers the
//! batch. The aggregation job (minutes period) runs the engine's merge
//! cycle. Both jobs run on scheduler worker threads; nothing here is a
//! process-wide singleton.

use crate::aggregate::{AggregationEngine, CycleSummary};
use crate::buffer::SampleBuffer;
use crate::config::Config;
use crate::input::InputActivityTracker;
use crate::sampler::{PeripheralKind, PeripheralUsageProbe, SampleError, WindowSampler};
use crate::scheduler::{PeriodicScheduler, SchedulerError};
use crate::sink::{AggregateSink, SinkError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// One collection tick: capture windows, mark peripheral flags, buffer.
pub struct CollectionTask {
    sampler: Arc<dyn WindowSampler>,
    probe: Arc<dyn PeripheralUsageProbe>,
    buffer: Arc<SampleBuffer>,
}

impl CollectionTask {
    pub fn new(
        sampler: Arc<dyn WindowSampler>,
        probe: Arc<dyn PeripheralUsageProbe>,
        buffer: Arc<SampleBuffer>,
    ) -> Self {
        Self {
            sampler,
            probe,
            buffer,
        }
    }

    /// Capture one batch, set each snapshot's peripheral flags, and
    /// append the batch to the buffer. Returns the number of windows
    /// captured.
    pub fn run_once(&self) -> Result<usize, SampleError> {
        let mut snapshots = self.sampler.capture_once()?;
        if snapshots.is_empty() {
            return Ok(0);
        }

        let media = self.probe.active_processes(PeripheralKind::Media)?;
        let microphone = self.probe.active_processes(PeripheralKind::Microphone)?;

        for snapshot in &mut snapshots {
            snapshot.media_in_use = intersects(&snapshot.pids, &media.pids);
            snapshot.media_shared = intersects(&snapshot.pids, &media.parent_pids);
            snapshot.microphone_in_use = intersects(&snapshot.pids, &microphone.pids);
            snapshot.microphone_shared = intersects(&snapshot.pids, &microphone.parent_pids);
        }

        let count = snapshots.len();
        self.buffer.append(snapshots);
        Ok(count)
    }
}

fn intersects(pids: &[u32], active: &HashSet<u32>) -> bool {
    pids.iter().any(|pid| active.contains(pid))
}

/// The assembled agent: buffers, tracker, engine, and scheduler jobs.
pub struct Agent {
    scheduler: PeriodicScheduler,
    task: Arc<CollectionTask>,
    engine: Arc<AggregationEngine>,
    tracker: Arc<InputActivityTracker>,
}

impl Agent {
    /// Wire the pipeline from configuration and collaborators.
    pub fn new(
        config: &Config,
        sampler: Arc<dyn WindowSampler>,
        probe: Arc<dyn PeripheralUsageProbe>,
        sink: Arc<dyn AggregateSink>,
    ) -> Self {
        let buffer = Arc::new(SampleBuffer::new());
        let tracker = Arc::new(InputActivityTracker::new());
        let engine = Arc::new(AggregationEngine::new(
            buffer.clone(),
            tracker.clone(),
            sink,
            config.sample_secs(),
        ));
        let task = Arc::new(CollectionTask::new(sampler, probe, buffer));

        let mut scheduler = PeriodicScheduler::new();
        {
            let task = task.clone();
            scheduler.schedule("collect", config.collect_period(), move || {
                match task.run_once() {
                    Ok(count) => debug!(windows = count, "capture tick buffered"),
                    Err(e) => warn!(error = %e, "capture tick failed"),
                }
            });
        }
        {
            let engine = engine.clone();
            scheduler.schedule("aggregate", config.aggregate_period(), move || {
                if let Err(e) = engine.merge_cycle() {
                    error!(error = %e, "sink rejected batch; cycle data dropped");
                }
            });
        }

        Self {
            scheduler,
            task,
            engine,
            tracker,
        }
    }

    /// Shared tracker for wiring an input event source.
    pub fn tracker(&self) -> Arc<InputActivityTracker> {
        self.tracker.clone()
    }

    /// Start both scheduled jobs.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        self.scheduler.start()
    }

    /// Stop the scheduler, letting in-flight jobs finish.
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Run one collection tick immediately, off-schedule.
    pub fn collect_once(&self) -> Result<usize, SampleError> {
        self.task.run_once()
    }

    /// Merge whatever is buffered right now, off-schedule. Used for a
    /// final flush at shutdown.
    pub fn flush(&self) -> Result<Option<CycleSummary>, SinkError> {
        self.engine.merge_cycle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{PeripheralActivity, ProcessSnapshot, WindowSnapshot};
    use crate::sink::MemorySink;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Replays scripted capture batches.
    struct ScriptedSampler {
        batches: Mutex<Vec<Vec<WindowSnapshot>>>,
    }

    impl ScriptedSampler {
        fn new(batches: Vec<Vec<WindowSnapshot>>) -> Self {
            Self {
                batches: Mutex::new(batches),
            }
        }
    }

    impl WindowSampler for ScriptedSampler {
        fn capture_once(&self) -> Result<Vec<WindowSnapshot>, SampleError> {
            let mut batches = self.batches.lock().unwrap();
            if batches.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(batches.remove(0))
            }
        }
    }

    /// Reports fixed active pid sets for both peripherals.
    struct StaticProbe {
        media: PeripheralActivity,
        microphone: PeripheralActivity,
    }

    impl PeripheralUsageProbe for StaticProbe {
        fn active_processes(&self, kind: PeripheralKind) -> Result<PeripheralActivity, SampleError> {
            Ok(match kind {
                PeripheralKind::Media => self.media.clone(),
                PeripheralKind::Microphone => self.microphone.clone(),
            })
        }
    }

    fn window_with_pids(window_id: u64, pids: Vec<u32>) -> WindowSnapshot {
        let mut snapshot = WindowSnapshot::new(window_id, "w", Utc::now());
        snapshot.pids = pids;
        snapshot
    }

    #[test]
    fn test_collection_marks_peripheral_flags() {
        let buffer = Arc::new(SampleBuffer::new());
        let sampler = Arc::new(ScriptedSampler::new(vec![vec![
            window_with_pids(1, vec![100]),
            window_with_pids(2, vec![200]),
            window_with_pids(3, vec![300]),
        ]]));
        let probe = Arc::new(StaticProbe {
            media: PeripheralActivity {
                pids: [100].into(),
                parent_pids: [200].into(),
            },
            microphone: PeripheralActivity {
                pids: [300].into(),
                parent_pids: HashSet::new(),
            },
        });

        let task = CollectionTask::new(sampler, probe, buffer.clone());
        assert_eq!(task.run_once().unwrap(), 3);

        let drained = buffer.drain_and_reset();
        let batch = &drained[0];
        assert!(batch[0].media_in_use);
        assert!(!batch[0].media_shared);
        assert!(batch[1].media_shared);
        assert!(!batch[1].media_in_use);
        assert!(batch[2].microphone_in_use);
        assert!(!batch[2].media_in_use);
    }

    #[test]
    fn test_empty_capture_buffers_nothing() {
        let buffer = Arc::new(SampleBuffer::new());
        let task = CollectionTask::new(
            Arc::new(ScriptedSampler::new(vec![])),
            Arc::new(StaticProbe {
                media: PeripheralActivity::default(),
                microphone: PeripheralActivity::default(),
            }),
            buffer.clone(),
        );
        assert_eq!(task.run_once().unwrap(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_agent_manual_collect_and_flush() {
        let mut process = ProcessSnapshot::new(100, "editor");
        process.memory.rss = 1000;
        let mut snapshot = window_with_pids(7, vec![100]);
        snapshot.processes.push(process);

        let sink = Arc::new(MemorySink::new());
        let config = Config::default();
        let agent = Agent::new(
            &config,
            Arc::new(ScriptedSampler::new(vec![vec![snapshot]])),
            Arc::new(StaticProbe {
                media: PeripheralActivity::default(),
                microphone: PeripheralActivity::default(),
            }),
            sink.clone(),
        );

        agent.tracker().record_key_press(7, "a");
        assert_eq!(agent.collect_once().unwrap(), 1);

        let summary = agent.flush().unwrap().expect("buffered data flushed");
        assert_eq!(summary.windows, 1);
        assert!(summary.initiative_use);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.batches()[0].windows[&7].input.key_presses, 1);
    }
}
