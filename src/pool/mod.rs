//! Worker Pool Module
//!
//! Bounded, self-resizing set of worker threads draining one FIFO job queue.
//!
//! ## Responsibilities
//! - Keep at least `min` and at most `max` workers alive
//! - Grow by one worker per submission when pending work catches up with
//!   the worker count
//! - Reclaim workers idle for longer than the timeout (never below `min`)
//! - Cancel idle workers on shutdown without interrupting running jobs
//!
//! ## Locking
//! ```text
//!   workers: Mutex<Vec<Worker>>   add/remove workers
//!   jobs:    crossbeam channel    enqueue/dequeue (own internal lock)
//! ```
//! Spawning a worker never blocks a dequeue and vice versa.
//!
//! The queue is unbounded: when every worker is busy at `max`, new jobs
//! wait in the queue instead of being rejected.

mod worker;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, UndisError};

use worker::{Shared, Worker};

/// A unit of work run once by some worker
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Submissions between two automatic cleanup passes
pub const CLEANUP_INTERVAL: usize = 10;

/// Dynamic pool of worker threads
pub struct WorkerPool {
    min_workers: usize,
    max_workers: usize,
    idle_timeout: Duration,

    /// Live workers
    workers: Mutex<Vec<Worker>>,

    /// Producer side of the job queue
    jobs: Sender<Job>,

    /// Queue receiver and counters shared with the workers
    shared: Arc<Shared>,

    /// Submissions since the last cleanup pass
    submissions: AtomicUsize,

    next_worker_id: AtomicUsize,

    closed: AtomicBool,
}

impl WorkerPool {
    /// Create a pool and start `min_workers` workers
    pub fn new(min_workers: usize, max_workers: usize, idle_timeout: Duration) -> Result<Self> {
        if max_workers == 0 {
            return Err(UndisError::Config("max_workers must be at least 1".to_string()));
        }
        if min_workers > max_workers {
            return Err(UndisError::Config(format!(
                "min_workers ({}) exceeds max_workers ({})",
                min_workers, max_workers
            )));
        }

        let (jobs_tx, jobs_rx) = channel::unbounded::<Job>();

        let pool = Self {
            min_workers,
            max_workers,
            idle_timeout,
            workers: Mutex::new(Vec::with_capacity(max_workers)),
            jobs: jobs_tx,
            shared: Arc::new(Shared::new(jobs_rx)),
            submissions: AtomicUsize::new(0),
            next_worker_id: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        };

        {
            let mut workers = pool.workers.lock();
            for _ in 0..min_workers {
                pool.spawn_worker(&mut workers)?;
            }
        }

        tracing::debug!(
            "Worker pool started (min={}, max={}, idle_timeout={:?})",
            min_workers,
            max_workers,
            idle_timeout
        );

        Ok(pool)
    }

    /// Create a pool sized by the pool settings in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.pool_min_workers,
            config.pool_max_workers,
            config.pool_idle_timeout,
        )
    }

    /// Submit a job
    ///
    /// Spawns one extra worker first when pending work already covers every
    /// worker and the pool is below `max`. Every `CLEANUP_INTERVAL`
    /// submissions a cleanup pass runs.
    pub fn queue_job<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut workers = self.workers.lock();
        if self.closed.load(Ordering::SeqCst) {
            return Err(UndisError::PoolClosed);
        }

        let pending = self.shared.pending.load(Ordering::SeqCst);
        if pending >= workers.len() && workers.len() < self.max_workers {
            if let Err(e) = self.spawn_worker(&mut workers) {
                tracing::warn!("Failed to grow worker pool: {}", e);
            }
        }

        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        if self.jobs.send(Box::new(job)).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(UndisError::PoolClosed);
        }

        if self.submissions.fetch_add(1, Ordering::SeqCst) + 1 >= CLEANUP_INTERVAL {
            self.reap(&mut workers);
        }

        Ok(())
    }

    /// Grow the pool to `target` workers (clamped to `max`); never shrinks
    pub fn grow(&self, target: usize) -> Result<()> {
        let target = target.min(self.max_workers);

        let mut workers = self.workers.lock();
        if self.closed.load(Ordering::SeqCst) {
            return Err(UndisError::PoolClosed);
        }
        while workers.len() < target {
            self.spawn_worker(&mut workers)?;
        }
        Ok(())
    }

    /// Reclaim workers idle for longer than the timeout, down to `min`
    pub fn cleanup(&self) {
        let mut workers = self.workers.lock();
        self.reap(&mut workers);
    }

    /// Stop the pool
    ///
    /// Idle workers are retired and joined. Workers in the middle of a job
    /// are cancelled and detached; they exit once their job returns.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let workers = std::mem::take(&mut *self.workers.lock());

        let total = workers.len();
        let mut detached = 0;
        for worker in workers {
            if worker.retire_if_idle() {
                worker.join();
            } else {
                detached += 1;
                worker.detach();
            }
        }

        tracing::info!(
            "Worker pool shut down ({} joined, {} still running)",
            total - detached,
            detached
        );
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of live workers
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Number of workers currently running a job
    ///
    /// After `shutdown`, workers detached mid-job keep counting here until
    /// their job returns.
    pub fn busy_count(&self) -> usize {
        self.shared.busy.load(Ordering::SeqCst)
    }

    /// Workers not currently running a job
    pub fn available(&self) -> usize {
        self.worker_count().saturating_sub(self.busy_count())
    }

    /// Jobs waiting for a worker
    pub fn queued_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn min_workers(&self) -> usize {
        self.min_workers
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Whether `shutdown` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Internals (called with the workers lock held)
    // =========================================================================

    fn spawn_worker(&self, workers: &mut Vec<Worker>) -> Result<()> {
        if workers.len() >= self.max_workers {
            return Ok(());
        }

        let id = self.next_worker_id.fetch_add(1, Ordering::SeqCst);
        let worker = Worker::spawn(id, Arc::clone(&self.shared))?;
        workers.push(worker);

        tracing::debug!(worker = id, "Spawned worker ({} total)", workers.len());
        Ok(())
    }

    fn reap(&self, workers: &mut Vec<Worker>) {
        self.submissions.store(0, Ordering::SeqCst);

        let now = self.shared.now_ticks();
        let timeout_ms = u64::try_from(self.idle_timeout.as_millis()).unwrap_or(u64::MAX);

        let mut removed = 0;
        let mut index = 0;
        while index < workers.len() && workers.len() > self.min_workers {
            // A retired worker can no longer claim a job, so joining it is quick
            if workers[index].retire_if_idle_longer_than(now, timeout_ms) {
                let worker = workers.remove(index);
                tracing::debug!(worker = worker.id(), "Reclaiming idle worker");
                worker.join();
                removed += 1;
            } else {
                index += 1;
            }
        }

        if removed > 0 {
            tracing::info!(
                "Reclaimed {} idle workers ({} remaining)",
                removed,
                workers.len()
            );
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
