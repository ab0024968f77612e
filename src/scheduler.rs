//! Fixed-interval job scheduling on dedicated worker threads.
//!
//! Each registered job gets its own worker thread driven by a
//! `crossbeam_channel` ticker. Invocations of one job never overlap: the
//! worker runs the job to completion, then discards any ticks that fired
//! meanwhile, so a cycle that outlasts its period skips ticks instead of
//! queueing them. A panicking invocation is caught and logged; the job
//! keeps its schedule.

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

type Job = Arc<dyn Fn() + Send + Sync + 'static>;

struct JobSpec {
    name: String,
    period: Duration,
    job: Job,
}

/// Runs named jobs at fixed intervals, off the caller's thread.
///
/// Jobs are registered with [`schedule`](Self::schedule) and begin
/// executing after the first elapsed period once [`start`](Self::start)
/// is called. [`stop`](Self::stop) lets in-flight invocations finish
/// before returning and prevents new ones from starting.
pub struct PeriodicScheduler {
    jobs: Vec<JobSpec>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Option<Sender<()>>,
}

impl PeriodicScheduler {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            workers: Vec::new(),
            shutdown: None,
        }
    }

    /// Register a job to run every `period`.
    ///
    /// Re-scheduling an existing name replaces the previous job. Takes
    /// effect on the next [`start`](Self::start).
    pub fn schedule(
        &mut self,
        name: impl Into<String>,
        period: Duration,
        job: impl Fn() + Send + Sync + 'static,
    ) {
        let name = name.into();
        self.jobs.retain(|spec| spec.name != name);
        self.jobs.push(JobSpec {
            name,
            period,
            job: Arc::new(job),
        });
    }

    /// Spawn one worker per registered job.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.shutdown.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        for spec in &self.jobs {
            self.workers.push(spawn_worker(
                spec.name.clone(),
                spec.period,
                spec.job.clone(),
                shutdown_rx.clone(),
            ));
        }
        self.shutdown = Some(shutdown_tx);
        Ok(())
    }

    /// Stop all workers, waiting for in-flight invocations to finish.
    pub fn stop(&mut self) {
        // Dropping the sender disconnects every worker's shutdown
        // receiver; workers exit after their current invocation.
        self.shutdown.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_some()
    }

    /// Names of registered jobs, in registration order.
    pub fn job_names(&self) -> Vec<String> {
        self.jobs.iter().map(|spec| spec.name.clone()).collect()
    }
}

impl Default for PeriodicScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PeriodicScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_worker(
    name: String,
    period: Duration,
    job: Job,
    shutdown: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let ticker = tick(period);
        loop {
            select! {
                recv(ticker) -> _ => {
                    debug!(job = %name, "tick");
                    if catch_unwind(AssertUnwindSafe(|| (job)())).is_err() {
                        error!(job = %name, "job panicked; invocation abandoned");
                    }
                    // Ticks that fired during the run are stale; the next
                    // invocation waits a full period from now.
                    while ticker.try_recv().is_ok() {}
                }
                recv(shutdown) -> _ => break,
            }
        }
        debug!(job = %name, "worker stopped");
    })
}

/// Errors from scheduler lifecycle calls.
#[derive(Debug)]
pub enum SchedulerError {
    AlreadyRunning,
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::AlreadyRunning => write!(f, "scheduler is already running"),
        }
    }
}

impl std::error::Error for SchedulerError {}
