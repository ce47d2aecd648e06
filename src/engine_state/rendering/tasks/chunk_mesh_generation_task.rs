//! Job that lights and meshes a chunk on a worker thread.
//!
//! A [`MeshJob`] is a self-contained snapshot: the chunk's blocks, copies of its
//! lateral neighbors' blocks and light, and a shared handle to the immutable
//! block registry. Nothing in it is touched by the coordinating thread after
//! submission, so the worker never needs a lock.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::debug;
use web_time::Instant;

use crate::engine_state::{
    rendering::meshing::{greedy_mesh, ChunkMeshes, MeshInput, MesherOptions},
    voxels::{
        block::{block_side::ChunkNeighbors, BlockId, BlockRegistry},
        chunk::ChunkPosition,
        light::LightField,
    },
};

/// A snapshot of everything needed to mesh one chunk.
#[derive(Clone, Debug)]
pub struct MeshJob {
    /// Chunk being meshed
    pub position: ChunkPosition,
    /// Version of the chunk's blocks when the snapshot was taken
    pub data_version: u64,
    /// Copy of the chunk's blocks
    pub blocks: Box<[BlockId]>,
    /// The chunk's light, if still valid for `blocks`. Computed on the worker otherwise.
    pub light: Option<LightField>,
    /// Copies of the lateral neighbors' blocks
    pub neighbor_blocks: ChunkNeighbors<Box<[BlockId]>>,
    /// Copies of the lateral neighbors' light fields
    pub neighbor_light: ChunkNeighbors<LightField>,
    /// Shared block metadata
    pub registry: Arc<BlockRegistry>,
    /// Mesher policy
    pub options: MesherOptions,
}

/// Output of a [`MeshJob`].
#[derive(Clone, Debug)]
pub struct MeshResult {
    /// Chunk that was meshed
    pub position: ChunkPosition,
    /// Version of the blocks the mesh was built from
    pub data_version: u64,
    /// Opaque and transparent geometry
    pub meshes: ChunkMeshes,
    /// Light computed on the worker, when the job did not carry one
    pub computed_light: Option<LightField>,
}

impl MeshJob {
    /// Hash of the full input snapshot.
    ///
    /// The position is deliberately excluded: meshes are chunk-local, so two
    /// chunks with identical content and surroundings share one mesh.
    pub fn cache_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.blocks.hash(&mut hasher);
        self.light.hash(&mut hasher);
        self.neighbor_blocks.hash(&mut hasher);
        self.neighbor_light.hash(&mut hasher);
        self.registry.hash(&mut hasher);
        self.options.hash(&mut hasher);
        hasher.finish()
    }

    /// Computes light if needed, then meshes the chunk.
    pub fn run(self) -> MeshResult {
        let start = Instant::now();
        let (light, computed) = match self.light {
            Some(light) => (light, false),
            None => (LightField::compute(&self.blocks, &self.registry), true),
        };

        let meshes = greedy_mesh(&MeshInput {
            blocks: &self.blocks,
            light: &light,
            neighbor_blocks: self.neighbor_blocks.each_ref().map(|blocks| blocks.as_deref()),
            neighbor_light: self.neighbor_light.each_ref().map(Option::as_ref),
            registry: &self.registry,
            options: &self.options,
        });

        debug!(
            "Meshed chunk ({}, {}) v{} in {:?}{}",
            self.position.x,
            self.position.y,
            self.data_version,
            start.elapsed(),
            if computed { " with light" } else { "" }
        );

        MeshResult {
            position: self.position,
            data_version: self.data_version,
            meshes,
            computed_light: computed.then_some(light),
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;
    use crate::engine_state::voxels::chunk::{
        chunk_creation::{FlatTerrain, TerrainGenerator},
        CHUNK_VOLUME,
    };

    fn job() -> MeshJob {
        let chunk = FlatTerrain {
            height: 4,
            block: 1,
        }
        .generate(Point2::new(0, 0));
        MeshJob {
            position: chunk.position,
            data_version: chunk.data_version(),
            blocks: chunk.blocks().into(),
            light: None,
            neighbor_blocks: Default::default(),
            neighbor_light: Default::default(),
            registry: Arc::new(BlockRegistry::with_defaults()),
            options: MesherOptions::default(),
        }
    }

    #[test]
    fn missing_light_is_computed_and_returned() {
        let result = job().run();
        let light = result.computed_light.expect("light computed on the worker");
        assert_eq!(light.sunlight(0, 4, 0), 15);
        assert_eq!(result.meshes.opaque.quad_count(), 5);
    }

    #[test]
    fn supplied_light_is_not_returned() {
        let mut job = job();
        job.light = Some(LightField::compute(&job.blocks, &job.registry));
        assert!(job.run().computed_light.is_none());
    }

    #[test]
    fn cache_key_ignores_position_but_not_content() {
        let a = job();
        let mut moved = job();
        moved.position = Point2::new(9, -4);
        assert_eq!(a.cache_key(), moved.cache_key());

        let mut edited = job();
        edited.blocks[CHUNK_VOLUME - 1] = 2;
        assert_ne!(a.cache_key(), edited.cache_key());

        let mut with_neighbor = job();
        with_neighbor.neighbor_blocks[0] = Some(a.blocks.clone());
        assert_ne!(a.cache_key(), with_neighbor.cache_key());
    }
}
