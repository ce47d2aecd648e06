//! # Worker Pool Fairness Test
//!
//! Submitting 2N jobs to an N-worker pool keeps exactly N workers busy and
//! starts the other N strictly in submission order as workers free up.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use voxel_streaming::engine_state::task_management::{Worker, WorkerPool};

const WORKERS: usize = 3;
const TIMEOUT: Duration = Duration::from_secs(5);

/// Reports when it starts a job, then waits for that job's gate.
struct GatedWorker {
    started: Sender<usize>,
}

impl Worker for GatedWorker {
    type Job = (usize, Receiver<()>);
    type Output = usize;

    fn process(&mut self, (id, gate): Self::Job) -> usize {
        let _ = self.started.send(id);
        let _ = gate.recv();
        id
    }
}

#[test]
fn queued_jobs_dispatch_in_submission_order() {
    let (started, started_rx) = crossbeam_channel::unbounded();
    let mut pool = WorkerPool::new(
        WORKERS,
        Box::new(move || GatedWorker {
            started: started.clone(),
        }),
    )
    .unwrap();

    let (gates, handles): (Vec<_>, Vec<_>) = (0..2 * WORKERS)
        .map(|id| {
            let (open, gate) = crossbeam_channel::unbounded();
            (open, pool.submit((id, gate)))
        })
        .unzip();

    assert_eq!(pool.busy_count(), WORKERS);
    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.queued_len(), WORKERS);

    let mut first: Vec<usize> = (0..WORKERS)
        .map(|_| started_rx.recv_timeout(TIMEOUT).unwrap())
        .collect();
    first.sort_unstable();
    assert_eq!(first, (0..WORKERS).collect::<Vec<_>>());
    assert!(started_rx.recv_timeout(Duration::from_millis(50)).is_err());

    // Finish the running jobs one at a time; each frees exactly one worker
    // for the oldest queued job.
    for finished in 0..WORKERS {
        gates[finished].send(()).unwrap();
        assert_eq!(
            pool.wait_for(&handles[finished], TIMEOUT).unwrap().unwrap(),
            finished
        );
        assert_eq!(started_rx.recv_timeout(TIMEOUT).unwrap(), WORKERS + finished);
        assert_eq!(pool.queued_len(), WORKERS - finished - 1);
        assert_eq!(pool.busy_count(), WORKERS);
    }

    for (id, gate) in gates.iter().enumerate().skip(WORKERS) {
        gate.send(()).unwrap();
        assert_eq!(pool.wait_for(&handles[id], TIMEOUT).unwrap().unwrap(), id);
    }
    assert_eq!(pool.busy_count(), 0);
    assert_eq!(pool.stats().completed, 2 * WORKERS as u64);
}

#[test]
fn dropped_handles_do_not_stall_the_queue() {
    let (started, _started_rx) = crossbeam_channel::unbounded();
    let mut pool = WorkerPool::new(
        1,
        Box::new(move || GatedWorker {
            started: started.clone(),
        }),
    )
    .unwrap();

    let (open, gate) = crossbeam_channel::unbounded();
    drop(pool.submit((0, gate)));
    let (open_next, gate_next) = crossbeam_channel::unbounded();
    let next = pool.submit((1, gate_next));

    drop(open);
    open_next.send(()).unwrap();
    assert_eq!(pool.wait_for(&next, TIMEOUT).unwrap().unwrap(), 1);
}
