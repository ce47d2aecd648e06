//! # Chunk Module
//!
//! This module provides the `VoxelChunk` struct: one fixed-size column of
//! blocks stored as a single contiguous array, plus the indexing helpers that
//! every other subsystem shares.
//!
//! ## Memory Layout
//!
//! Blocks are stored one byte per voxel at index `(x * CHUNK_WIDTH + z) * CHUNK_HEIGHT + y`.
//! Y varies fastest, so a vertical scan of one column (light seeding, terrain
//! fill) walks consecutive bytes.
//!
//! ## Bounds
//!
//! Reads outside the chunk return air and writes outside the chunk are ignored.
//! Unloaded neighbors and the space above and below the world are "no data",
//! which is a normal case in the hot loops that query voxels.

use cgmath::Point2;

use super::block::block_side::ChunkNeighbor;
use super::block::{BlockId, AIR};
use super::light::LightField;

pub mod chunk_creation;

/// Horizontal extent of a chunk in blocks (both X and Z).
pub const CHUNK_WIDTH: usize = 16;
/// Vertical extent of a chunk in blocks.
pub const CHUNK_HEIGHT: usize = 256;
/// The number of blocks in a single chunk.
pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_WIDTH * CHUNK_HEIGHT;
/// Extent of a chunk along each axis, indexed by axis (X, Y, Z).
pub const CHUNK_DIMENSIONS: [usize; 3] = [CHUNK_WIDTH, CHUNK_HEIGHT, CHUNK_WIDTH];

/// Position of a chunk on the horizontal chunk grid, `(cx, cz)`.
pub type ChunkPosition = Point2<i32>;

/// Flat array index of a local coordinate. The caller guarantees bounds.
#[inline]
pub fn block_index(x: usize, y: usize, z: usize) -> usize {
    (x * CHUNK_WIDTH + z) * CHUNK_HEIGHT + y
}

/// Flat array index of a possibly out-of-bounds local coordinate.
#[inline]
pub fn checked_block_index(x: i32, y: i32, z: i32) -> Option<usize> {
    let in_bounds = (0..CHUNK_WIDTH as i32).contains(&x)
        && (0..CHUNK_HEIGHT as i32).contains(&y)
        && (0..CHUNK_WIDTH as i32).contains(&z);
    in_bounds.then(|| block_index(x as usize, y as usize, z as usize))
}

/// Splits a world block coordinate into its chunk position and local `(x, z)`.
pub fn world_to_chunk(world_x: i32, world_z: i32) -> (ChunkPosition, i32, i32) {
    let width = CHUNK_WIDTH as i32;
    (
        Point2::new(world_x.div_euclid(width), world_z.div_euclid(width)),
        world_x.rem_euclid(width),
        world_z.rem_euclid(width),
    )
}

/// Lateral neighbors whose boundary faces depend on the voxel at local `(x, z)`.
pub fn boundary_neighbors(x: i32, z: i32) -> Vec<ChunkNeighbor> {
    let last = CHUNK_WIDTH as i32 - 1;
    let mut neighbors = Vec::with_capacity(2);
    if x == 0 {
        neighbors.push(ChunkNeighbor::WEST);
    }
    if x == last {
        neighbors.push(ChunkNeighbor::EAST);
    }
    if z == 0 {
        neighbors.push(ChunkNeighbor::NORTH);
    }
    if z == last {
        neighbors.push(ChunkNeighbor::SOUTH);
    }
    neighbors
}

/// One chunk of block data.
///
/// Besides the blocks, a chunk carries the bookkeeping the orchestrator needs:
/// a `dirty` flag for stale meshes, a `data_version` that changes on every
/// effective write, and the cached light field (dropped whenever blocks change).
#[derive(Clone, Debug)]
pub struct VoxelChunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkPosition,
    blocks: Box<[BlockId]>,
    light: Option<LightField>,
    dirty: bool,
    data_version: u64,
    has_mesh: bool,
}

impl VoxelChunk {
    /// Creates a chunk filled with air. New chunks start dirty.
    pub fn new(position: ChunkPosition) -> Self {
        VoxelChunk {
            position,
            blocks: vec![AIR; CHUNK_VOLUME].into_boxed_slice(),
            light: None,
            dirty: true,
            data_version: 0,
            has_mesh: false,
        }
    }

    /// Gets the block at a local coordinate, or air if it lies outside the chunk.
    #[inline]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId {
        checked_block_index(x, y, z).map_or(AIR, |index| self.blocks[index])
    }

    /// Writes a block at a local coordinate.
    ///
    /// Returns `true` if the stored block changed. Out-of-bounds writes and
    /// writes of the value already present are no-ops and leave the chunk clean.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockId) -> bool {
        let Some(index) = checked_block_index(x, y, z) else {
            return false;
        };
        if self.blocks[index] == block {
            return false;
        }
        self.blocks[index] = block;
        self.invalidate();
        true
    }

    /// Read-only view of the whole block array.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Mutable view of the whole block array. Marks the chunk as modified.
    pub fn blocks_mut(&mut self) -> &mut [BlockId] {
        self.invalidate();
        &mut self.blocks
    }

    fn invalidate(&mut self) {
        self.dirty = true;
        self.data_version += 1;
        self.light = None;
    }

    /// The cached light field, if it has been computed for the current blocks.
    pub fn light(&self) -> Option<&LightField> {
        self.light.as_ref()
    }

    /// Stores a light field computed from the blocks at `data_version`.
    ///
    /// Returns `false` and drops the field if the blocks changed since.
    pub fn store_light(&mut self, light: LightField, data_version: u64) -> bool {
        if data_version != self.data_version {
            return false;
        }
        self.light = Some(light);
        true
    }

    /// Counter bumped on every effective block write.
    pub fn data_version(&self) -> u64 {
        self.data_version
    }

    /// Whether the mesh of this chunk is stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flags the mesh of this chunk as stale without touching block data.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the dirty flag. Called once a mesh job has been queued.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Whether a mesh has ever been handed to the renderer for this chunk.
    pub fn has_mesh(&self) -> bool {
        self.has_mesh
    }

    pub(crate) fn set_has_mesh(&mut self, has_mesh: bool) {
        self.has_mesh = has_mesh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_function_matches_array_length() {
        let last = block_index(CHUNK_WIDTH - 1, CHUNK_HEIGHT - 1, CHUNK_WIDTH - 1);
        assert_eq!(last, CHUNK_VOLUME - 1);
        assert_eq!(block_index(0, 1, 0), 1);
        assert_eq!(block_index(0, 0, 1), CHUNK_HEIGHT);
        assert_eq!(block_index(1, 0, 0), CHUNK_WIDTH * CHUNK_HEIGHT);
    }

    #[test]
    fn out_of_bounds_access_is_silent() {
        let mut chunk = VoxelChunk::new(Point2::new(0, 0));
        chunk.mark_clean();
        assert!(!chunk.set_block(-1, 0, 0, 1));
        assert!(!chunk.set_block(0, CHUNK_HEIGHT as i32, 0, 1));
        assert!(!chunk.set_block(0, 0, CHUNK_WIDTH as i32, 1));
        assert_eq!(chunk.get_block(0, -1, 0), AIR);
        assert!(!chunk.is_dirty());
        assert_eq!(chunk.data_version(), 0);
    }

    #[test]
    fn writes_mark_dirty_and_drop_light() {
        let mut chunk = VoxelChunk::new(Point2::new(2, -3));
        chunk.mark_clean();
        let light = LightField::dark();
        assert!(chunk.store_light(light, 0));
        assert!(chunk.light().is_some());

        assert!(chunk.set_block(3, 4, 5, 1));
        assert_eq!(chunk.get_block(3, 4, 5), 1);
        assert!(chunk.is_dirty());
        assert!(chunk.light().is_none());
        assert_eq!(chunk.data_version(), 1);

        // Same value again: nothing changes.
        chunk.mark_clean();
        assert!(!chunk.set_block(3, 4, 5, 1));
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn stale_light_is_rejected() {
        let mut chunk = VoxelChunk::new(Point2::new(0, 0));
        chunk.set_block(0, 0, 0, 1);
        assert!(!chunk.store_light(LightField::dark(), 0));
        assert!(chunk.light().is_none());
    }

    #[test]
    fn world_coordinates_resolve_with_negative_wrap() {
        assert_eq!(world_to_chunk(0, 0), (Point2::new(0, 0), 0, 0));
        assert_eq!(world_to_chunk(-1, 17), (Point2::new(-1, 1), 15, 1));
        assert_eq!(world_to_chunk(-16, -17), (Point2::new(-1, -2), 0, 15));
    }

    #[test]
    fn boundary_voxels_report_affected_neighbors() {
        assert!(boundary_neighbors(5, 5).is_empty());
        assert_eq!(boundary_neighbors(0, 7), vec![ChunkNeighbor::WEST]);
        assert_eq!(
            boundary_neighbors(15, 0),
            vec![ChunkNeighbor::EAST, ChunkNeighbor::NORTH]
        );
    }
}
