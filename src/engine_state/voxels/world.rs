//! # World Module
//!
//! This module provides the `ChunkOrchestrator`, which owns every loaded chunk
//! and drives each one through its lifecycle:
//!
//! ```text
//! absent -> generated (dirty) -> meshing -> meshed -> dirty (edit) -> ... -> unloaded
//! ```
//!
//! ## Frame Update
//!
//! [`ChunkOrchestrator::update`] runs once per frame on the coordinating thread:
//!
//! 1. Unload chunks beyond `render_distance + unload_margin`
//! 2. Generate missing chunks nearest-first, up to the generation budget
//! 3. Apply finished mesh jobs
//! 4. Queue dirty chunks within `mesh_distance`, nearest-first, up to the mesh budget
//!
//! It never blocks on a worker. Results that come back for chunks that were
//! unloaded meanwhile are dropped, and chunks edited while their job was in
//! flight are simply queued again.
//!
//! ## Neighbor Dependencies
//!
//! A chunk's boundary faces depend on its lateral neighbors' blocks and light.
//! Neighbors are therefore marked dirty when a chunk is generated, when a
//! boundary voxel is edited, and when a chunk's light is recomputed.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use cgmath::{Point2, Point3, Vector2};
use log::{debug, info, warn};
use lru::LruCache;

use crate::config::{EngineConfig, StreamingConfig};
use crate::engine_state::{
    rendering::{
        meshing::{ChunkMeshes, MesherOptions},
        tasks::{Job, JobOutput, MeshJob, MeshResult, MeshWorker},
        ChunkRenderer,
    },
    task_management::{JobHandle, PoolStats, WorkerPool},
};
use crate::error::PoolError;

use super::block::{block_side::ChunkNeighbor, BlockId, BlockRegistry, AIR};
use super::chunk::{
    boundary_neighbors, chunk_creation::TerrainGenerator, world_to_chunk, ChunkPosition,
    VoxelChunk, CHUNK_WIDTH,
};
use super::light::LightField;

/// Lifecycle state of a chunk as seen by the orchestrator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Not loaded.
    ABSENT,
    /// Loaded and never meshed.
    GENERATED,
    /// A mesh job is in flight.
    MESHING,
    /// The renderer holds an up-to-date mesh.
    MESHED,
    /// The renderer holds a stale mesh.
    DIRTY,
}

/// What one call to [`ChunkOrchestrator::update`] did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Chunks generated.
    pub generated: usize,
    /// Chunks unloaded.
    pub unloaded: usize,
    /// Mesh jobs submitted.
    pub queued: usize,
    /// Meshes served from the cache without a job.
    pub cache_hits: usize,
    /// Mesh results handed to the renderer.
    pub applied: usize,
    /// Mesh results rejected by validation.
    pub rejected: usize,
    /// Jobs lost to a worker crash.
    pub failed: usize,
    /// Jobs cancelled by pool disposal.
    pub cancelled: usize,
}

impl FrameReport {
    /// Whether the frame neither started nor finished any work.
    pub fn is_quiet(&self) -> bool {
        *self == FrameReport::default()
    }
}

/// A submitted mesh job.
struct InFlightMesh {
    handle: JobHandle<JobOutput>,
    cache_key: u64,
}

/// A mesh cache entry, with the light its job computed for chunks that had none.
#[derive(Clone)]
struct CachedMesh {
    meshes: Arc<ChunkMeshes>,
    light: Option<LightField>,
}

/// Owns the chunk map and schedules generation, meshing and unloading.
pub struct ChunkOrchestrator {
    chunks: HashMap<ChunkPosition, VoxelChunk>,
    in_flight: HashMap<ChunkPosition, InFlightMesh>,
    pool: WorkerPool<MeshWorker>,
    cache: Option<LruCache<u64, CachedMesh>>,
    rings: Vec<Vector2<i32>>,
    generator: Box<dyn TerrainGenerator>,
    registry: Arc<BlockRegistry>,
    streaming: StreamingConfig,
    mesher: MesherOptions,
}

/// Chunk containing a world-space position.
pub fn observer_chunk(observer: Point3<f32>) -> ChunkPosition {
    let width = CHUNK_WIDTH as f32;
    Point2::new(
        (observer.x / width).floor() as i32,
        (observer.z / width).floor() as i32,
    )
}

fn distance_squared(a: ChunkPosition, b: ChunkPosition) -> i32 {
    let dx = a.x - b.x;
    let dz = a.y - b.y;
    dx * dx + dz * dz
}

/// Offsets within `radius`, nearest first, ties broken by `(x, z)`.
fn ring_offsets(radius: i32) -> Vec<Vector2<i32>> {
    let mut offsets: Vec<Vector2<i32>> = (-radius..=radius)
        .flat_map(|dx| (-radius..=radius).map(move |dz| Vector2::new(dx, dz)))
        .filter(|offset| offset.x * offset.x + offset.y * offset.y <= radius * radius)
        .collect();
    offsets.sort_by_key(|offset| {
        (offset.x * offset.x + offset.y * offset.y, offset.x, offset.y)
    });
    offsets
}

fn present(renderer: &mut dyn ChunkRenderer, position: ChunkPosition, meshes: &ChunkMeshes) {
    let opaque = (!meshes.opaque.is_empty()).then_some(&meshes.opaque);
    let transparent = (!meshes.transparent.is_empty()).then_some(&meshes.transparent);
    renderer.update(position, opaque, transparent);
}

impl ChunkOrchestrator {
    /// Creates an orchestrator and starts its worker pool.
    ///
    /// # Arguments
    /// * `config` - Streaming, mesher, block and worker settings
    /// * `generator` - Fills newly loaded chunks
    ///
    /// # Returns
    /// The orchestrator, or the error that prevented the worker pool from starting
    pub fn new(
        config: &EngineConfig,
        generator: Box<dyn TerrainGenerator>,
    ) -> Result<Self, PoolError> {
        let pool = WorkerPool::new(config.resolved_worker_count(), Box::new(MeshWorker::new))?;
        let cache = NonZeroUsize::new(config.streaming.mesh_cache_capacity).map(LruCache::new);

        Ok(ChunkOrchestrator {
            chunks: HashMap::new(),
            in_flight: HashMap::new(),
            pool,
            cache,
            rings: ring_offsets(config.streaming.render_distance),
            generator,
            registry: Arc::new(config.block_registry()),
            streaming: config.streaming,
            mesher: config.mesher,
        })
    }

    /// Generates every chunk within render distance, ignoring the budget.
    ///
    /// # Returns
    /// The number of chunks generated
    pub fn load_initial(&mut self, observer: Point3<f32>) -> usize {
        let center = observer_chunk(observer);
        let mut generated = 0;
        for offset in self.rings.clone() {
            if self.generate(center + offset) {
                generated += 1;
            }
        }
        info!(
            "Initial load around chunk ({}, {}): {} chunks",
            center.x, center.y, generated
        );
        generated
    }

    /// Advances chunk streaming and meshing by one frame.
    pub fn update(
        &mut self,
        observer: Point3<f32>,
        renderer: &mut dyn ChunkRenderer,
    ) -> FrameReport {
        let center = observer_chunk(observer);
        let mut report = FrameReport::default();

        self.unload_distant(center, renderer, &mut report);
        self.generate_nearby(center, &mut report);
        self.integrate_results(renderer, &mut report);
        self.queue_dirty(center, renderer, &mut report);

        if !report.is_quiet() {
            debug!("Frame at chunk ({}, {}): {:?}", center.x, center.y, report);
        }
        report
    }

    fn unload_distant(
        &mut self,
        center: ChunkPosition,
        renderer: &mut dyn ChunkRenderer,
        report: &mut FrameReport,
    ) {
        let limit = self.streaming.render_distance + self.streaming.unload_margin;
        let distant: Vec<ChunkPosition> = self
            .chunks
            .keys()
            .copied()
            .filter(|&position| distance_squared(position, center) > limit * limit)
            .collect();

        for position in distant {
            if let Some(chunk) = self.chunks.remove(&position) {
                if self.in_flight.remove(&position).is_some() {
                    debug!(
                        "Dropping in-flight mesh of unloaded chunk ({}, {})",
                        position.x, position.y
                    );
                }
                if chunk.has_mesh() {
                    renderer.update(position, None, None);
                }
                report.unloaded += 1;
            }
        }
    }

    fn generate_nearby(&mut self, center: ChunkPosition, report: &mut FrameReport) {
        for index in 0..self.rings.len() {
            if report.generated >= self.streaming.generation_budget {
                break;
            }
            if self.generate(center + self.rings[index]) {
                report.generated += 1;
            }
        }
    }

    /// Generates the chunk at `position` if it is not loaded.
    fn generate(&mut self, position: ChunkPosition) -> bool {
        if self.chunks.contains_key(&position) {
            return false;
        }
        let chunk = self.generator.generate(position);
        self.chunks.insert(position, chunk);
        for neighbor in ChunkNeighbor::all() {
            if let Some(chunk) = self.chunks.get_mut(&(position + neighbor.offset())) {
                chunk.mark_dirty();
            }
        }
        true
    }

    fn integrate_results(&mut self, renderer: &mut dyn ChunkRenderer, report: &mut FrameReport) {
        self.pool.poll();

        let finished: Vec<(ChunkPosition, Result<JobOutput, PoolError>)> = self
            .in_flight
            .iter()
            .filter_map(|(&position, in_flight)| {
                in_flight.handle.try_take().map(|result| (position, result))
            })
            .collect();

        for (position, result) in finished {
            let Some(in_flight) = self.in_flight.remove(&position) else {
                continue;
            };
            match result {
                Ok(JobOutput::Mesh(result)) => {
                    self.apply_result(result, in_flight.cache_key, renderer, report)
                }
                Err(err) if err.is_cancellation() => report.cancelled += 1,
                Err(err) => {
                    warn!("Mesh job for chunk ({}, {}) failed: {}", position.x, position.y, err);
                    report.failed += 1;
                    if let Some(chunk) = self.chunks.get_mut(&position) {
                        chunk.mark_dirty();
                    }
                }
            }
        }
    }

    fn apply_result(
        &mut self,
        result: MeshResult,
        cache_key: u64,
        renderer: &mut dyn ChunkRenderer,
        report: &mut FrameReport,
    ) {
        let position = result.position;
        let Some(chunk) = self.chunks.get_mut(&position) else {
            return;
        };

        if let Err(err) = result.meshes.validate() {
            warn!("Rejected mesh for chunk ({}, {}): {}", position.x, position.y, err);
            chunk.mark_dirty();
            report.rejected += 1;
            return;
        }

        let light = result.computed_light;
        let light_stored = light
            .clone()
            .is_some_and(|light| chunk.store_light(light, result.data_version));
        chunk.set_has_mesh(true);
        if light_stored {
            self.dirty_lit_neighbors(position);
        }

        let meshes = Arc::new(result.meshes);
        present(renderer, position, &meshes);
        if let Some(cache) = self.cache.as_mut() {
            cache.put(cache_key, CachedMesh { meshes, light });
        }
        report.applied += 1;
    }

    /// Marks the neighbors whose boundary faces were built from this chunk's
    /// previous light. Chunks that were never meshed pick it up on their first job.
    fn dirty_lit_neighbors(&mut self, position: ChunkPosition) {
        for neighbor in ChunkNeighbor::all() {
            let neighbor_position = position + neighbor.offset();
            let in_flight = self.in_flight.contains_key(&neighbor_position);
            if let Some(neighbor_chunk) = self.chunks.get_mut(&neighbor_position) {
                if neighbor_chunk.has_mesh() || in_flight {
                    neighbor_chunk.mark_dirty();
                }
            }
        }
    }

    fn queue_dirty(
        &mut self,
        center: ChunkPosition,
        renderer: &mut dyn ChunkRenderer,
        report: &mut FrameReport,
    ) {
        if self.pool.is_disposed() {
            return;
        }

        let mesh_distance = self.streaming.mesh_distance;
        let mut candidates: Vec<ChunkPosition> = self
            .chunks
            .iter()
            .filter(|(position, chunk)| {
                chunk.is_dirty()
                    && !self.in_flight.contains_key(*position)
                    && distance_squared(**position, center) <= mesh_distance * mesh_distance
            })
            .map(|(&position, _)| position)
            .collect();
        candidates.sort_by_key(|&position| {
            (distance_squared(position, center), position.x, position.y)
        });
        candidates.truncate(self.streaming.mesh_budget);

        for position in candidates {
            let Some(job) = self.snapshot(position) else {
                continue;
            };
            let cache_key = job.cache_key();

            let cached = self.cache.as_mut().and_then(|cache| cache.get(&cache_key).cloned());
            if let Some(CachedMesh { meshes, light }) = cached {
                present(renderer, position, &meshes);
                let mut light_stored = false;
                if let Some(chunk) = self.chunks.get_mut(&position) {
                    chunk.mark_clean();
                    chunk.set_has_mesh(true);
                    // Same blocks, same light: adopt the light the cached job computed.
                    if let Some(light) = light.filter(|_| chunk.light().is_none()) {
                        let version = chunk.data_version();
                        light_stored = chunk.store_light(light, version);
                    }
                }
                if light_stored {
                    self.dirty_lit_neighbors(position);
                }
                report.cache_hits += 1;
                continue;
            }

            let handle = self.pool.submit(Job::Mesh(job));
            self.in_flight.insert(position, InFlightMesh { handle, cache_key });
            if let Some(chunk) = self.chunks.get_mut(&position) {
                chunk.mark_clean();
            }
            report.queued += 1;
        }
    }

    /// Copies a chunk and its lateral neighbors into a mesh job.
    fn snapshot(&self, position: ChunkPosition) -> Option<MeshJob> {
        let chunk = self.chunks.get(&position)?;
        let neighbors = ChunkNeighbor::all()
            .map(|neighbor| self.chunks.get(&(position + neighbor.offset())));

        Some(MeshJob {
            position,
            data_version: chunk.data_version(),
            blocks: chunk.blocks().into(),
            light: chunk.light().cloned(),
            neighbor_blocks: neighbors.map(|neighbor| neighbor.map(|chunk| chunk.blocks().into())),
            neighbor_light: neighbors.map(|neighbor| neighbor.and_then(|chunk| chunk.light().cloned())),
            registry: Arc::clone(&self.registry),
            options: self.mesher,
        })
    }

    /// Writes a block at a world position.
    ///
    /// Marks the owning chunk dirty and drops its light. Writes on a chunk
    /// boundary also mark the neighbor across that boundary dirty.
    ///
    /// # Returns
    /// `false` if the chunk is not loaded, the position is out of range or the
    /// block was already there
    pub fn set_block(&mut self, world_x: i32, world_y: i32, world_z: i32, block: BlockId) -> bool {
        let (position, x, z) = world_to_chunk(world_x, world_z);
        let Some(chunk) = self.chunks.get_mut(&position) else {
            return false;
        };
        if !chunk.set_block(x, world_y, z, block) {
            return false;
        }
        for neighbor in boundary_neighbors(x, z) {
            if let Some(chunk) = self.chunks.get_mut(&(position + neighbor.offset())) {
                chunk.mark_dirty();
            }
        }
        true
    }

    /// Reads a block at a world position. Unloaded chunks read as air.
    pub fn get_block(&self, world_x: i32, world_y: i32, world_z: i32) -> BlockId {
        let (position, x, z) = world_to_chunk(world_x, world_z);
        self.chunks
            .get(&position)
            .map_or(AIR, |chunk| chunk.get_block(x, world_y, z))
    }

    /// Lifecycle state of the chunk at `position`.
    pub fn chunk_state(&self, position: ChunkPosition) -> ChunkState {
        let Some(chunk) = self.chunks.get(&position) else {
            return ChunkState::ABSENT;
        };
        if self.in_flight.contains_key(&position) {
            ChunkState::MESHING
        } else if !chunk.has_mesh() {
            ChunkState::GENERATED
        } else if chunk.is_dirty() {
            ChunkState::DIRTY
        } else {
            ChunkState::MESHED
        }
    }

    /// The chunk at `position`, if loaded.
    pub fn chunk(&self, position: ChunkPosition) -> Option<&VoxelChunk> {
        self.chunks.get(&position)
    }

    /// Number of loaded chunks.
    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of mesh jobs awaiting integration.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether no mesh job is outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Blocks for up to `timeout` until a worker reports, if any job is outstanding.
    pub fn wait_for_work(&mut self, timeout: Duration) {
        if !self.in_flight.is_empty() {
            self.pool.poll_timeout(timeout);
        }
    }

    /// Counters of the underlying worker pool.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// The shared block registry.
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Stops the worker pool. Outstanding jobs resolve as cancelled on the
    /// next update and are not retried.
    pub fn dispose(&mut self) {
        self.pool.dispose();
    }
}
