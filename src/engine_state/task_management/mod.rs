//! # Task Management System
//!
//! This module provides a bounded pool of worker threads for CPU-bound work
//! such as light propagation and meshing, keeping the coordinating thread
//! free to run its frame loop.
//!
//! ## Architecture Overview
//!
//! - `WorkerPool`: owns the worker threads, the FIFO backlog and per-worker busy state
//! - `Worker`: the per-thread executor the pool is generic over
//! - `JobHandle`: returned by `submit`, resolves once the result is delivered
//!
//! Every worker has a dedicated job channel and runs at most one job at a
//! time. All workers report on a single event channel, which only the owner
//! of the pool drains via `poll()`. Results, crashes and dispatch of the next
//! queued job all happen inside that call, so no pool state is ever touched
//! from a worker thread.
//!
//! ## Job Lifecycle
//! 1. `submit()` hands the job to the lowest-numbered idle worker, or queues it
//! 2. The worker processes the job and reports an event
//! 3. `poll()` routes the result to the job's handle, marks the worker idle
//!    and dispatches the oldest queued job to it
//! 4. A panicking worker rejects its job with `PoolError::WorkerCrashed` and
//!    is replaced by a new worker from the factory
//! 5. `dispose()` rejects everything outstanding with `PoolError::Cancelled`
//!
//! ## Example Usage
//! ```ignore
//! let mut pool = WorkerPool::new(4, Box::new(|| MyWorker::default()))?;
//! let handle = pool.submit(job);
//!
//! // In the frame loop:
//! pool.poll();
//! if let Some(result) = handle.try_take() {
//!     // ...
//! }
//! ```

pub mod task;

use std::any::Any;
use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use web_time::Instant;

pub use task::{JobHandle, PoolStats, Worker};

use crate::error::PoolError;

/// Prefix of worker thread names.
pub const WORKER_THREAD_PREFIX: &str = "voxel-worker";

/// Creates the executor for a worker slot. Called once per spawn and respawn.
pub type WorkerFactory<W> = Box<dyn Fn() -> W + Send>;

type Reply<O> = Sender<Result<O, PoolError>>;

/// A job waiting for a worker.
struct PendingJob<W: Worker> {
    id: u64,
    job: W::Job,
    reply: Reply<W::Output>,
}

/// The job a worker is currently processing.
struct InFlight<O> {
    id: u64,
    reply: Reply<O>,
}

/// Message from a worker thread to the pool owner.
struct WorkerEvent<O> {
    worker: usize,
    job_id: u64,
    outcome: Result<O, String>,
}

/// One worker thread and the bookkeeping the pool keeps about it.
struct WorkerSlot<W: Worker> {
    index: usize,
    jobs: Option<Sender<(u64, W::Job)>>,
    thread: Option<JoinHandle<()>>,
    in_flight: Option<InFlight<W::Output>>,
}

/// A fixed-size pool of worker threads with a FIFO backlog.
///
/// At most one job runs per worker, so at most `worker_count()` jobs are in
/// flight. Queued jobs are dispatched strictly in submission order.
pub struct WorkerPool<W: Worker> {
    slots: Vec<WorkerSlot<W>>,
    queue: VecDeque<PendingJob<W>>,
    factory: WorkerFactory<W>,
    event_sender: Sender<WorkerEvent<W::Output>>,
    events: Receiver<WorkerEvent<W::Output>>,
    next_job_id: u64,
    stats: PoolStats,
    disposed: bool,
}

impl<W: Worker> WorkerPool<W> {
    /// Creates a pool and starts `worker_count` worker threads.
    ///
    /// # Arguments
    /// * `worker_count` - Number of worker threads, at least 1
    /// * `factory` - Creates the executor for each worker thread
    ///
    /// # Returns
    /// The pool, or an error if the count is zero or a thread could not be started
    pub fn new(worker_count: usize, factory: WorkerFactory<W>) -> Result<Self, PoolError> {
        if worker_count == 0 {
            return Err(PoolError::InvalidWorkerCount);
        }

        let (event_sender, events) = crossbeam_channel::unbounded();
        let mut slots = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            slots.push(spawn_worker(index, &factory, &event_sender)?);
        }

        info!("Worker pool started with {} workers", worker_count);

        Ok(WorkerPool {
            slots,
            queue: VecDeque::new(),
            factory,
            event_sender,
            events,
            next_job_id: 0,
            stats: PoolStats::default(),
            disposed: false,
        })
    }

    /// Submits a job.
    ///
    /// The job starts immediately if a worker is idle, otherwise it joins the
    /// back of the queue. After disposal the returned handle is already
    /// rejected with [`PoolError::Cancelled`].
    pub fn submit(&mut self, job: W::Job) -> JobHandle<W::Output> {
        let (reply, receiver) = crossbeam_channel::bounded(1);
        let id = self.next_job_id;
        self.next_job_id += 1;
        let handle = JobHandle::new(id, receiver);

        if self.disposed || self.slots.is_empty() {
            let error = if self.disposed {
                self.stats.cancelled += 1;
                PoolError::Cancelled
            } else {
                PoolError::Disconnected
            };
            let _ = reply.send(Err(error));
            return handle;
        }

        let pending = PendingJob { id, job, reply };
        match self.slots.iter().position(|slot| slot.in_flight.is_none()) {
            Some(position) => self.dispatch(position, pending),
            None => self.queue.push_back(pending),
        }
        handle
    }

    /// Sends a job to the worker at `position`, which must be idle.
    ///
    /// If the worker is gone, the job is rejected and the replacement worker
    /// takes the oldest queued job instead.
    fn dispatch(&mut self, position: usize, pending: PendingJob<W>) {
        let slot = &mut self.slots[position];
        let sent = slot
            .jobs
            .as_ref()
            .map(|jobs| jobs.send((pending.id, pending.job)).is_ok())
            .unwrap_or(false);

        if sent {
            slot.in_flight = Some(InFlight {
                id: pending.id,
                reply: pending.reply,
            });
        } else {
            warn!("Worker {} stopped accepting jobs", slot.index);
            let _ = pending.reply.send(Err(PoolError::Disconnected));
            if self.respawn(position) {
                if let Some(next) = self.queue.pop_front() {
                    self.dispatch(position, next);
                }
            }
        }
    }

    /// Delivers every result that is ready, without blocking.
    ///
    /// # Returns
    /// The number of worker events handled
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for at least one result, then delivers all ready ones.
    pub fn poll_timeout(&mut self, timeout: Duration) -> usize {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                1 + self.poll()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Polls until `handle` resolves or `timeout` elapses.
    ///
    /// Other results that arrive meanwhile are delivered as usual.
    pub fn wait_for(
        &mut self,
        handle: &JobHandle<W::Output>,
        timeout: Duration,
    ) -> Option<Result<W::Output, PoolError>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(result) = handle.try_take() {
                return Some(result);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            self.poll_timeout(deadline - now);
        }
    }

    fn handle_event(&mut self, event: WorkerEvent<W::Output>) {
        if self.disposed {
            return;
        }
        let Some(position) = self.slots.iter().position(|slot| slot.index == event.worker) else {
            return;
        };
        let in_flight = match self.slots[position].in_flight.take() {
            Some(in_flight) if in_flight.id == event.job_id => in_flight,
            other => {
                self.slots[position].in_flight = other;
                return;
            }
        };

        match event.outcome {
            Ok(output) => {
                self.stats.completed += 1;
                let _ = in_flight.reply.send(Ok(output));
            }
            Err(reason) => {
                self.stats.crashed += 1;
                warn!("Worker {} crashed on job {}: {}", event.worker, event.job_id, reason);
                let _ = in_flight.reply.send(Err(PoolError::WorkerCrashed {
                    worker: event.worker,
                    reason,
                }));
                if !self.respawn(position) {
                    return;
                }
            }
        }

        if let Some(pending) = self.queue.pop_front() {
            self.dispatch(position, pending);
        }
    }

    /// Replaces the worker at `position` with a fresh one.
    ///
    /// Returns `false` if no replacement could be started, in which case the
    /// slot is removed and the pool shrinks by one.
    fn respawn(&mut self, position: usize) -> bool {
        let index = self.slots[position].index;
        let old = &mut self.slots[position];
        old.jobs = None;
        if let Some(thread) = old.thread.take() {
            if thread.join().is_err() {
                warn!("Worker {} exited with an uncaught panic", index);
            }
        }

        match spawn_worker(index, &self.factory, &self.event_sender) {
            Ok(slot) => {
                self.slots[position] = slot;
                self.stats.respawned += 1;
                info!("Worker {} respawned", index);
                true
            }
            Err(err) => {
                error!("Failed to respawn worker {}: {}", index, err);
                self.slots.remove(position);
                if self.slots.is_empty() {
                    error!("Worker pool has no workers left");
                    for pending in self.queue.drain(..) {
                        let _ = pending.reply.send(Err(PoolError::Disconnected));
                    }
                }
                false
            }
        }
    }

    /// Stops the pool.
    ///
    /// Every queued and in-flight job is rejected with [`PoolError::Cancelled`].
    /// Idle workers are joined; busy ones are detached and their output is
    /// discarded. Calling this more than once has no further effect.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let queued = self.queue.len();
        for pending in self.queue.drain(..) {
            self.stats.cancelled += 1;
            let _ = pending.reply.send(Err(PoolError::Cancelled));
        }

        let mut detached = 0;
        for mut slot in self.slots.drain(..) {
            slot.jobs = None;
            match slot.in_flight.take() {
                Some(in_flight) => {
                    self.stats.cancelled += 1;
                    let _ = in_flight.reply.send(Err(PoolError::Cancelled));
                    detached += 1;
                }
                None => {
                    if let Some(thread) = slot.thread.take() {
                        let _ = thread.join();
                    }
                }
            }
        }

        info!(
            "Worker pool disposed: {} queued jobs cancelled, {} busy workers detached",
            queued, detached
        );
    }

    /// Number of workers currently processing a job.
    pub fn busy_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.in_flight.is_some()).count()
    }

    /// Number of workers waiting for a job.
    pub fn idle_count(&self) -> usize {
        self.slots.len() - self.busy_count()
    }

    /// Number of jobs waiting for a worker.
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether [`WorkerPool::dispose`] has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Running counters.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

impl<W: Worker> Drop for WorkerPool<W> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn spawn_worker<W: Worker>(
    index: usize,
    factory: &WorkerFactory<W>,
    events: &Sender<WorkerEvent<W::Output>>,
) -> io::Result<WorkerSlot<W>> {
    let (job_sender, jobs) = crossbeam_channel::unbounded::<(u64, W::Job)>();
    let events = events.clone();
    let worker = factory();

    let thread = thread::Builder::new()
        .name(format!("{}-{}", WORKER_THREAD_PREFIX, index))
        .spawn(move || run_worker(index, worker, jobs, events))?;

    Ok(WorkerSlot {
        index,
        jobs: Some(job_sender),
        thread: Some(thread),
        in_flight: None,
    })
}

/// Body of a worker thread. Exits when its job channel closes, when the pool
/// is gone, or after a panic (the pool then starts a replacement).
fn run_worker<W: Worker>(
    index: usize,
    mut worker: W,
    jobs: Receiver<(u64, W::Job)>,
    events: Sender<WorkerEvent<W::Output>>,
) {
    debug!("Worker {} started", index);
    while let Ok((job_id, job)) = jobs.recv() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.process(job)))
            .map_err(panic_message);
        let crashed = outcome.is_err();
        if events
            .send(WorkerEvent {
                worker: index,
                job_id,
                outcome,
            })
            .is_err()
            || crashed
        {
            break;
        }
    }
    debug!("Worker {} stopped", index);
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
