//! # Task System Core Types
//!
//! This module defines the building blocks the worker pool is generic over.
//!
//! ## Core Components
//! - `Worker`: a unit of execution that turns jobs into outputs on its own thread
//! - `JobHandle`: the caller's side of a submitted job
//! - `PoolStats`: running counters kept by the pool
//!
//! ## Job Lifecycle
//! 1. A job is submitted via `WorkerPool::submit()` and a `JobHandle` is returned
//! 2. The job waits in the FIFO queue until a worker is idle
//! 3. The worker's `process()` method runs on the worker thread
//! 4. The output is routed back to the handle when the owner calls `WorkerPool::poll()`
//!
//! ## Thread Safety
//! - `Worker` must be `Send` to be moved onto its thread
//! - Jobs and outputs must be `Send`; they are moved, never shared

use crossbeam_channel::{Receiver, TryRecvError};

use crate::error::PoolError;

/// Executes jobs on a dedicated worker thread.
///
/// A worker owns its state (scratch buffers, caches) exclusively. If
/// `process` panics the worker is discarded and replaced by a fresh one from
/// the pool's factory.
pub trait Worker: Send + 'static {
    /// Input of one unit of work.
    type Job: Send + 'static;
    /// Result of one unit of work.
    type Output: Send + 'static;

    /// Processes one job to completion.
    fn process(&mut self, job: Self::Job) -> Self::Output;
}

/// Caller side of a submitted job.
///
/// The result is delivered exactly once. Dropping the handle does not cancel
/// the job; its output is discarded when it arrives.
#[derive(Debug)]
pub struct JobHandle<O> {
    id: u64,
    receiver: Receiver<Result<O, PoolError>>,
}

impl<O> JobHandle<O> {
    pub(super) fn new(id: u64, receiver: Receiver<Result<O, PoolError>>) -> Self {
        JobHandle { id, receiver }
    }

    /// Submission sequence number, unique per pool.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Takes the result if it has been delivered.
    ///
    /// Returns `None` while the job is queued or running. After the result has
    /// been taken, further calls report [`PoolError::Disconnected`].
    pub fn try_take(&self) -> Option<Result<O, PoolError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PoolError::Disconnected)),
        }
    }
}

/// Running counters of a worker pool.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs that produced an output.
    pub completed: u64,
    /// Jobs whose worker panicked.
    pub crashed: u64,
    /// Workers replaced after a crash.
    pub respawned: u64,
    /// Jobs rejected by disposal.
    pub cancelled: u64,
}
