//! Rendering boundary of the voxel engine.
//!
//! This module produces renderable geometry; it does not draw it. Meshes are
//! handed to an implementation of [`ChunkRenderer`], which owns materials,
//! culling and GPU resources. [`RetainedMeshes`] is a headless implementation
//! that keeps the latest meshes in memory.

use std::collections::HashMap;

use log::trace;

use crate::engine_state::voxels::chunk::ChunkPosition;

pub mod meshing;
pub mod tasks;
pub mod vertex;

// Re-export commonly used types
pub use meshing::{ChunkMeshes, MeshBuffers};
pub use vertex::ChunkVertex;

/// Consumer of chunk meshes.
pub trait ChunkRenderer {
    /// Replaces the geometry of the chunk at `position`.
    ///
    /// `None` for a pass means the chunk has no faces of that kind; passing
    /// `None` for both removes the chunk's geometry entirely.
    fn update(
        &mut self,
        position: ChunkPosition,
        opaque: Option<&MeshBuffers>,
        transparent: Option<&MeshBuffers>,
    );
}

/// The geometry a [`RetainedMeshes`] renderer holds for one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RetainedChunk {
    /// Interleaved opaque vertices and their indices
    pub opaque: Option<(Vec<ChunkVertex>, Vec<u32>)>,
    /// Interleaved transparent vertices and their indices
    pub transparent: Option<(Vec<ChunkVertex>, Vec<u32>)>,
}

/// A renderer that keeps the latest interleaved meshes of every chunk in memory.
#[derive(Debug, Default)]
pub struct RetainedMeshes {
    chunks: HashMap<ChunkPosition, RetainedChunk>,
    updates: u64,
}

impl RetainedMeshes {
    /// Creates an empty renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry currently held for `position`.
    pub fn get(&self, position: ChunkPosition) -> Option<&RetainedChunk> {
        self.chunks.get(&position)
    }

    /// Number of chunks with geometry.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk has geometry.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of `update` calls received, removals included.
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Total bytes of vertex data held, as it would be uploaded.
    pub fn vertex_bytes(&self) -> usize {
        self.chunks
            .values()
            .flat_map(|chunk| [&chunk.opaque, &chunk.transparent])
            .flatten()
            .map(|(vertices, _)| ChunkVertex::as_bytes(vertices).len())
            .sum()
    }
}

impl ChunkRenderer for RetainedMeshes {
    fn update(
        &mut self,
        position: ChunkPosition,
        opaque: Option<&MeshBuffers>,
        transparent: Option<&MeshBuffers>,
    ) {
        self.updates += 1;
        if opaque.is_none() && transparent.is_none() {
            trace!("Released geometry of chunk ({}, {})", position.x, position.y);
            self.chunks.remove(&position);
            return;
        }
        let retain = |buffers: &MeshBuffers| (buffers.interleaved(), buffers.indices.clone());
        self.chunks.insert(
            position,
            RetainedChunk {
                opaque: opaque.map(retain),
                transparent: transparent.map(retain),
            },
        );
    }
}
