//! Pool worker
//!
//! One long-lived thread draining the shared job queue.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Select, Sender, TryRecvError};

use super::Job;

/// State value meaning "currently running a job"
pub(super) const BUSY: u64 = 0;

/// State value meaning "reclaimed by the pool; exit without taking work"
pub(super) const RETIRED: u64 = u64::MAX;

/// State shared by the pool and all of its workers
pub(super) struct Shared {
    /// FIFO job queue (the channel carries its own lock)
    pub(super) jobs: Receiver<Job>,

    /// Workers currently executing a job
    pub(super) busy: AtomicUsize,

    /// Jobs submitted but not yet finished (queued + running)
    pub(super) pending: AtomicUsize,

    /// Origin for idle timestamps
    epoch: Instant,
}

impl Shared {
    pub(super) fn new(jobs: Receiver<Job>) -> Self {
        Self {
            jobs,
            busy: AtomicUsize::new(0),
            pending: AtomicUsize::new(0),
            epoch: Instant::now(),
        }
    }

    /// Milliseconds since the pool was created, offset so it never equals `BUSY`
    pub(super) fn now_ticks(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64 + 1
    }
}

/// Handle to one worker thread
pub(super) struct Worker {
    id: usize,

    /// Thread handle; `None` once joined or detached
    handle: Option<JoinHandle<()>>,

    /// Dropping this sender cancels the worker's idle wait
    stop: Option<Sender<()>>,

    /// When the worker last became idle, or `BUSY`, or `RETIRED`
    ///
    /// The worker moves idle → `BUSY` and the pool moves idle → `RETIRED`,
    /// each with a compare-and-swap on the same stamp, so exactly one wins.
    state: Arc<AtomicU64>,
}

impl Worker {
    /// Start a worker thread
    pub(super) fn spawn(id: usize, shared: Arc<Shared>) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);

        // Fresh workers count as idle from the moment they are spawned
        let state = Arc::new(AtomicU64::new(shared.now_ticks()));
        let thread_state = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name(format!("undis-worker-{}", id))
            .spawn(move || {
                run(&shared, &stop_rx, &thread_state);
                tracing::trace!(worker = id, "Worker exited");
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stop: Some(stop_tx),
            state,
        })
    }

    pub(super) fn id(&self) -> usize {
        self.id
    }

    /// Retire the worker if it has been idle for more than `timeout_ms` at `now`
    ///
    /// On success the worker is guaranteed never to start another job.
    pub(super) fn retire_if_idle_longer_than(&self, now: u64, timeout_ms: u64) -> bool {
        let since = self.state.load(Ordering::SeqCst);
        if since == BUSY || since == RETIRED || now.saturating_sub(since) <= timeout_ms {
            return false;
        }
        self.retire_from(since)
    }

    /// Retire the worker if it is idle at all
    pub(super) fn retire_if_idle(&self) -> bool {
        let since = self.state.load(Ordering::SeqCst);
        if since == BUSY || since == RETIRED {
            return false;
        }
        self.retire_from(since)
    }

    fn retire_from(&self, since: u64) -> bool {
        self.state
            .compare_exchange(since, RETIRED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Ask the worker to exit at its next idle wait
    fn cancel(&mut self) {
        self.stop.take();
    }

    /// Cancel and let the thread finish on its own
    pub(super) fn detach(mut self) {
        self.cancel();
        self.handle.take();
    }

    /// Cancel and wait for the thread to finish
    pub(super) fn join(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(worker = self.id, "Worker thread panicked");
            }
        }
    }
}

/// Worker loop: wait for a job or cancellation, claim, run the job, repeat
///
/// The worker waits for the queue to become ready without dequeuing, then
/// claims itself busy before taking a job. A worker the pool has already
/// retired loses the claim and exits with the job still queued.
fn run(shared: &Shared, stop: &Receiver<()>, state: &AtomicU64) {
    let mut idle_since = state.load(Ordering::SeqCst);

    loop {
        // Cancellation wins over queued work
        if let Err(TryRecvError::Disconnected) = stop.try_recv() {
            return;
        }

        let mut select = Select::new();
        let stop_index = select.recv(stop);
        select.recv(&shared.jobs);
        if select.ready() == stop_index {
            continue;
        }

        if state
            .compare_exchange(idle_since, BUSY, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let job = match shared.jobs.try_recv() {
            Ok(job) => job,
            Err(TryRecvError::Empty) => {
                // Another worker took it; go back to waiting with the old stamp
                state.store(idle_since, Ordering::SeqCst);
                continue;
            }
            Err(TryRecvError::Disconnected) => return,
        };

        shared.busy.fetch_add(1, Ordering::SeqCst);

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            tracing::error!("Job panicked: {}", panic_message(&*payload));
        }

        shared.busy.fetch_sub(1, Ordering::SeqCst);
        shared.pending.fetch_sub(1, Ordering::SeqCst);

        idle_since = shared.now_ticks();
        state.store(idle_since, Ordering::SeqCst);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
