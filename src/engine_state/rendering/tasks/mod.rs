//! Background jobs for the rendering system.
//!
//! Jobs cross the worker boundary as a tagged enum with one strongly typed
//! payload per kind. The worker decodes the tag once and hands the payload to
//! the matching routine.
//!
//! # Available Jobs
//! - `MeshJob`: computes light (if needed) and greedy meshes one chunk

pub mod chunk_mesh_generation_task;

pub use chunk_mesh_generation_task::{MeshJob, MeshResult};

use crate::engine_state::task_management::Worker;

/// Work that can be sent to a [`MeshWorker`].
#[derive(Clone, Debug)]
pub enum Job {
    /// Light and mesh one chunk.
    Mesh(MeshJob),
}

/// Output of a [`Job`], tagged like the job that produced it.
#[derive(Clone, Debug)]
pub enum JobOutput {
    /// Result of [`Job::Mesh`].
    Mesh(MeshResult),
}

/// The executor running on each pool thread.
#[derive(Debug, Default)]
pub struct MeshWorker;

impl MeshWorker {
    /// Creates a worker.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Worker for MeshWorker {
    type Job = Job;
    type Output = JobOutput;

    fn process(&mut self, job: Job) -> JobOutput {
        match job {
            Job::Mesh(mesh_job) => JobOutput::Mesh(mesh_job.run()),
        }
    }
}
