//! # Error Types
//!
//! All errors that can cross a module boundary in the engine. Out-of-bounds
//! voxel access is deliberately absent: it resolves to air or zero light.

use std::io;

use thiserror::Error;

/// Errors produced by the worker pool and delivered through job handles.
#[derive(Error, Debug)]
pub enum PoolError {
    /// A pool was requested with zero workers.
    #[error("a worker pool needs at least one worker")]
    InvalidWorkerCount,

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),

    /// The pool was disposed before the job produced a result.
    ///
    /// This is a shutdown signal, not a failure, and must not trigger retries.
    #[error("job cancelled by pool disposal")]
    Cancelled,

    /// The worker panicked while processing the job.
    #[error("worker {worker} crashed: {reason}")]
    WorkerCrashed {
        /// Index of the worker slot that crashed.
        worker: usize,
        /// Panic payload, if it was a string.
        reason: String,
    },

    /// The result channel closed without delivering a result.
    #[error("worker disconnected before delivering a result")]
    Disconnected,
}

impl PoolError {
    /// Whether this error only signals that the pool is shutting down.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PoolError::Cancelled)
    }
}

/// A mesh result whose buffers are internally inconsistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshValidationError {
    /// A vertex attribute array does not match the reported vertex count.
    #[error("{attribute} holds {actual} values, expected {expected}")]
    AttributeLength {
        /// Name of the attribute array.
        attribute: &'static str,
        /// Length implied by the vertex count.
        expected: usize,
        /// Actual length of the array.
        actual: usize,
    },

    /// The reported index count does not match the index list.
    #[error("index count {reported} does not match {actual} indices")]
    IndexCount {
        /// Count reported alongside the buffers.
        reported: u32,
        /// Length of the index list.
        actual: usize,
    },

    /// The index list does not describe whole triangles.
    #[error("index list length {0} is not a multiple of 3")]
    IncompleteTriangle(usize),

    /// An index points past the last vertex.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of vertices in the buffer.
        vertex_count: u32,
    },
}

/// Errors raised while loading the engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),

    /// The configuration is not valid JSON for [`EngineConfig`](crate::config::EngineConfig).
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that stop the engine from starting.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The worker pool could not be started.
    #[error(transparent)]
    Pool(#[from] PoolError),
}
