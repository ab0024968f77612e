//! End-to-end pipeline tests: capture -> buffer -> merge -> sink.

use activity_telemetry_agent::{
    AggregationEngine, InputActivityTracker, MemorySink, PeriodicScheduler, PeripheralActivity,
    PeripheralKind, PeripheralUsageProbe, ProcessSnapshot, SampleBuffer, SampleError,
    WindowSampler, WindowSnapshot,
};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Produces one synthetic window per capture, tagged with a sequence id.
struct CountingSampler {
    sequence: Mutex<u64>,
}

impl CountingSampler {
    fn new() -> Self {
        Self {
            sequence: Mutex::new(0),
        }
    }
}

impl WindowSampler for CountingSampler {
    fn capture_once(&self) -> Result<Vec<WindowSnapshot>, SampleError> {
        let mut sequence = self.sequence.lock().unwrap();
        *sequence += 1;

        let mut process = ProcessSnapshot::new(100, "editor");
        process.memory.rss = *sequence * 1000;
        process.io.read_bytes = 10;

        let mut snapshot = WindowSnapshot::new(7, "Editor", Utc::now());
        snapshot.is_foreground = true;
        snapshot.pids = vec![100];
        snapshot.processes.push(process);
        Ok(vec![snapshot])
    }
}

struct SilentProbe;

impl PeripheralUsageProbe for SilentProbe {
    fn active_processes(&self, _kind: PeripheralKind) -> Result<PeripheralActivity, SampleError> {
        Ok(PeripheralActivity::default())
    }
}

#[test]
fn test_scheduled_pipeline_delivers_batches() {
    let buffer = Arc::new(SampleBuffer::new());
    let tracker = Arc::new(InputActivityTracker::new());
    let sink = Arc::new(MemorySink::new());
    let engine = Arc::new(AggregationEngine::new(
        buffer.clone(),
        tracker.clone(),
        sink.clone(),
        5.0,
    ));
    let task = activity_telemetry_agent::CollectionTask::new(
        Arc::new(CountingSampler::new()),
        Arc::new(SilentProbe),
        buffer,
    );

    let mut scheduler = PeriodicScheduler::new();
    scheduler.schedule("collect", Duration::from_millis(15), move || {
        let _ = task.run_once();
    });
    {
        let engine = engine.clone();
        scheduler.schedule("aggregate", Duration::from_millis(70), move || {
            let _ = engine.merge_cycle();
        });
    }

    scheduler.start().unwrap();
    tracker.record_key_press(7, "a");
    thread::sleep(Duration::from_millis(250));
    scheduler.stop();

    // Final flush of whatever the last partial cycle buffered.
    let _ = engine.merge_cycle();

    let batches = sink.batches();
    assert!(!batches.is_empty(), "at least one cycle must have stored");

    // All snapshots land under window 7; cumulative foreground time is
    // 5s per captured snapshot.
    let total_snapshots: u64 = batches
        .iter()
        .map(|batch| batch.windows[&7].processes[&100].memory.samples)
        .sum();
    assert!(total_snapshots >= 2);
    let total_foreground: f64 = batches
        .iter()
        .map(|batch| batch.windows[&7].foreground_secs)
        .sum();
    assert_eq!(total_foreground, total_snapshots as f64 * 5.0);

    // The key press was recorded before the first cycle; exactly one
    // batch carries it.
    let initiative_batches = batches.iter().filter(|b| b.initiative_use).count();
    assert_eq!(initiative_batches, 1);
    let total_presses: u64 = batches
        .iter()
        .map(|batch| batch.windows[&7].input.key_presses)
        .sum();
    assert_eq!(total_presses, 1);
}

#[test]
fn test_append_racing_drain_is_never_lost() {
    // Thread A appends batch1, thread B drains concurrently, thread A
    // appends batch2. batch1 must show up in exactly one drain; batch2
    // must survive for the next one.
    for _ in 0..50 {
        let buffer = Arc::new(SampleBuffer::new());

        let appender = {
            let buffer = buffer.clone();
            thread::spawn(move || {
                buffer.append(vec![WindowSnapshot::new(1, "batch1", Utc::now())]);
                buffer.append(vec![WindowSnapshot::new(2, "batch2", Utc::now())]);
            })
        };
        let drainer = {
            let buffer = buffer.clone();
            thread::spawn(move || buffer.drain_and_reset())
        };

        appender.join().unwrap();
        let first = drainer.join().unwrap();
        let second = buffer.drain_and_reset();

        let mut seen: Vec<u64> = first
            .iter()
            .chain(second.iter())
            .map(|batch| batch[0].window_id)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2], "no batch lost or duplicated");
    }
}

#[test]
fn test_cycle_boundary_isolates_input_generations() {
    let buffer = Arc::new(SampleBuffer::new());
    let tracker = Arc::new(InputActivityTracker::new());
    let sink = Arc::new(MemorySink::new());
    let engine = AggregationEngine::new(buffer.clone(), tracker.clone(), sink.clone(), 5.0);

    tracker.record_mouse_scroll(7);
    buffer.append(vec![WindowSnapshot::new(7, "Editor", Utc::now())]);
    engine.merge_cycle().unwrap();

    // Second cycle: activity arrives but for a different window.
    tracker.record_mouse_move(8);
    buffer.append(vec![WindowSnapshot::new(8, "Browser", Utc::now())]);
    engine.merge_cycle().unwrap();

    let batches = sink.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].windows[&7].input.mouse_scrolls, 1);
    assert!(!batches[0].windows.contains_key(&8));
    assert_eq!(batches[1].windows[&8].input.mouse_moves, 1);
    assert_eq!(batches[1].windows[&8].input.mouse_scrolls, 0);
}
