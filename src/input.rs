//! Keyboard and mouse activity counters, keyed by the active window.
//!
//! Hook callbacks run on listener threads owned by the event source,
//! outside scheduler control. Each record call takes one lock, bumps a
//! counter, and returns; the lock is never held across anything slower
//! than a map insert.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Input counters accumulated for one window.
///
/// Counters only grow until a drain resets the owning tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSample {
    pub key_presses: u64,
    /// Press count per key identifier.
    pub keys: HashMap<String, u64>,
    pub mouse_moves: u64,
    pub mouse_scrolls: u64,
    pub left_clicks: u64,
    pub right_clicks: u64,
    pub other_clicks: u64,
}

impl InputSample {
    /// Total events recorded in this sample.
    pub fn total(&self) -> u64 {
        self.key_presses
            + self.mouse_moves
            + self.mouse_scrolls
            + self.left_clicks
            + self.right_clicks
            + self.other_clicks
    }

    /// Add another sample's counters into this one.
    pub fn merge(&mut self, other: &InputSample) {
        self.key_presses += other.key_presses;
        for (key, count) in &other.keys {
            *self.keys.entry(key.clone()).or_insert(0) += count;
        }
        self.mouse_moves += other.mouse_moves;
        self.mouse_scrolls += other.mouse_scrolls;
        self.left_clicks += other.left_clicks;
        self.right_clicks += other.right_clicks;
        self.other_clicks += other.other_clicks;
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    by_window: HashMap<u64, InputSample>,
    total_events: u64,
}

/// Thread-safe per-window input counters with atomic drain-and-reset.
///
/// A window's [`InputSample`] is created lazily on its first event. A
/// record call racing a drain lands entirely in one generation or the
/// other, never split.
#[derive(Debug, Default)]
pub struct InputActivityTracker {
    state: Mutex<TrackerState>,
}

impl InputActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press for the currently active window.
    pub fn record_key_press(&self, window_id: u64, key: &str) {
        let mut state = self.lock();
        state.total_events += 1;
        let sample = state.by_window.entry(window_id).or_default();
        sample.key_presses += 1;
        *sample.keys.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn record_mouse_move(&self, window_id: u64) {
        self.bump(window_id, |sample| sample.mouse_moves += 1);
    }

    pub fn record_mouse_scroll(&self, window_id: u64) {
        self.bump(window_id, |sample| sample.mouse_scrolls += 1);
    }

    pub fn record_left_click(&self, window_id: u64) {
        self.bump(window_id, |sample| sample.left_clicks += 1);
    }

    pub fn record_right_click(&self, window_id: u64) {
        self.bump(window_id, |sample| sample.right_clicks += 1);
    }

    pub fn record_other_click(&self, window_id: u64) {
        self.bump(window_id, |sample| sample.other_clicks += 1);
    }

    /// Atomically take the per-window samples and the total event count,
    /// resetting the tracker to empty.
    pub fn drain_and_reset(&self) -> (HashMap<u64, InputSample>, u64) {
        let taken = std::mem::take(&mut *self.lock());
        (taken.by_window, taken.total_events)
    }

    /// Total events recorded since the last drain.
    pub fn total_events(&self) -> u64 {
        self.lock().total_events
    }

    fn bump(&self, window_id: u64, update: impl FnOnce(&mut InputSample)) {
        let mut state = self.lock();
        state.total_events += 1;
        update(state.by_window.entry(window_id).or_default());
    }

    // A poisoned lock still holds structurally valid counters.
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Installs platform input hooks and feeds a shared tracker.
///
/// Implementations own their listener threads; the core only sees the
/// record calls arriving on the tracker.
pub trait InputEventSource: Send {
    fn start(&mut self) -> Result<(), InputSourceError>;
    fn stop(&mut self);
}

/// Errors from input hook installation.
#[derive(Debug)]
pub enum InputSourceError {
    AlreadyRunning,
    HookInstallationFailed(String),
}

impl std::fmt::Display for InputSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSourceError::AlreadyRunning => write!(f, "input source is already running"),
            InputSourceError::HookInstallationFailed(e) => {
                write!(f, "failed to install input hook: {e}")
            }
        }
    }
}

impl std::error::Error for InputSourceError {}

/// An event source that never emits events.
///
/// Exists so the binary runs on hosts without a hook backend.
pub struct NoopInputSource {
    running: AtomicBool,
    _tracker: Arc<InputActivityTracker>,
}

impl NoopInputSource {
    pub fn new(tracker: Arc<InputActivityTracker>) -> Self {
        Self {
            running: AtomicBool::new(false),
            _tracker: tracker,
        }
    }
}

impl InputEventSource for NoopInputSource {
    fn start(&mut self) -> Result<(), InputSourceError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(InputSourceError::AlreadyRunning);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_counters_per_window() {
        let tracker = InputActivityTracker::new();
        tracker.record_key_press(7, "a");
        tracker.record_key_press(7, "a");
        tracker.record_key_press(7, "b");
        tracker.record_mouse_move(7);
        tracker.record_left_click(9);

        let (by_window, total) = tracker.drain_and_reset();
        assert_eq!(total, 5);

        let seven = &by_window[&7];
        assert_eq!(seven.key_presses, 3);
        assert_eq!(seven.keys["a"], 2);
        assert_eq!(seven.keys["b"], 1);
        assert_eq!(seven.mouse_moves, 1);

        let nine = &by_window[&9];
        assert_eq!(nine.left_clicks, 1);
        assert_eq!(nine.key_presses, 0);
    }

    #[test]
    fn test_lazy_window_creation() {
        let tracker = InputActivityTracker::new();
        let (by_window, total) = tracker.drain_and_reset();
        assert!(by_window.is_empty());
        assert_eq!(total, 0);

        tracker.record_mouse_scroll(3);
        let (by_window, _) = tracker.drain_and_reset();
        assert_eq!(by_window.len(), 1, "only the touched window exists");
        assert!(by_window.contains_key(&3));
    }

    #[test]
    fn test_drain_resets_state() {
        let tracker = InputActivityTracker::new();
        tracker.record_right_click(1);
        tracker.drain_and_reset();

        let (by_window, total) = tracker.drain_and_reset();
        assert!(by_window.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_concurrent_records_all_counted() {
        let tracker = Arc::new(InputActivityTracker::new());
        let handles: Vec<_> = (0..4)
            .map(|w| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        tracker.record_key_press(w, "k");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (by_window, total) = tracker.drain_and_reset();
        assert_eq!(total, 2000);
        assert_eq!(by_window.len(), 4);
        assert!(by_window.values().all(|s| s.key_presses == 500));
    }

    #[test]
    fn test_sample_merge_adds_counters() {
        let mut a = InputSample {
            key_presses: 2,
            left_clicks: 1,
            ..InputSample::default()
        };
        a.keys.insert("x".into(), 2);

        let mut b = InputSample {
            key_presses: 3,
            mouse_moves: 4,
            ..InputSample::default()
        };
        b.keys.insert("x".into(), 1);
        b.keys.insert("y".into(), 2);

        a.merge(&b);
        assert_eq!(a.key_presses, 5);
        assert_eq!(a.keys["x"], 3);
        assert_eq!(a.keys["y"], 2);
        assert_eq!(a.mouse_moves, 4);
        assert_eq!(a.total(), 10);
    }

    #[test]
    fn test_noop_source_lifecycle() {
        let tracker = Arc::new(InputActivityTracker::new());
        let mut source = NoopInputSource::new(tracker);
        source.start().unwrap();
        assert!(matches!(
            source.start(),
            Err(InputSourceError::AlreadyRunning)
        ));
        source.stop();
        source.start().unwrap();
    }
}
