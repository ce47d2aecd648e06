//! Mesh generation for voxel rendering.
//!
//! This module turns chunk snapshots into opaque and transparent mesh buffers.
//! It has no state of its own: every call to [`greedy_mesh`] is a pure function
//! of its [`MeshInput`], so it runs on any worker thread and its output can be
//! cached by input.
//!
//! # Architecture
//! - `mesh/`: buffers, merged faces and the greedy meshing algorithm

/// Core mesh generation algorithms and data structures.
mod mesh;

// Re-export the mesh module's public interface for external use
pub use mesh::*;
