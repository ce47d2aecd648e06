//! # Chunk Creation Module
//!
//! Terrain generation sits outside the meshing pipeline: a generator is a pure
//! function that fills a zeroed block array for a chunk position. The
//! orchestrator only depends on the [`TerrainGenerator`] trait.

use noise::{NoiseFn, Perlin};

use crate::engine_state::voxels::block::{block_type::BlockType, BlockId};

use super::{block_index, ChunkPosition, VoxelChunk, CHUNK_HEIGHT, CHUNK_WIDTH};

/// Fills chunk block arrays.
///
/// Implementations must be deterministic for a given position and must only
/// write inside the provided slice, which is `CHUNK_VOLUME` long and all air.
pub trait TerrainGenerator: Send {
    /// Writes the blocks of the chunk at `position` into `blocks`.
    fn fill(&self, position: ChunkPosition, blocks: &mut [BlockId]);

    /// Creates a complete chunk at `position`.
    fn generate(&self, position: ChunkPosition) -> VoxelChunk {
        let mut chunk = VoxelChunk::new(position);
        self.fill(position, chunk.blocks_mut());
        chunk
    }
}

/// Flat ground of one block type up to (but excluding) `height`.
#[derive(Clone, Copy, Debug)]
pub struct FlatTerrain {
    /// Number of filled layers starting at `y = 0`.
    pub height: usize,
    /// Block used for every filled layer.
    pub block: BlockId,
}

impl TerrainGenerator for FlatTerrain {
    fn fill(&self, _position: ChunkPosition, blocks: &mut [BlockId]) {
        let height = self.height.min(CHUNK_HEIGHT);
        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                let column = block_index(x, 0, z);
                blocks[column..column + height].fill(self.block);
            }
        }
    }
}

/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;
/// Terrain height around which the noise oscillates.
pub const BASE_HEIGHT: f64 = 64.0;
/// Peak deviation from `BASE_HEIGHT`.
pub const HEIGHT_AMPLITUDE: f64 = 24.0;
/// Columns below this height are flooded with water.
pub const WATER_LEVEL: usize = 60;
/// On average one land column in this many is topped with glowstone.
pub const GLOWSTONE_RARITY: u64 = 97;

/// Rolling hills from a 2-D Perlin height map, with dirt, grass, lakes and
/// the odd glowstone lamp.
pub struct PerlinTerrain {
    perlin: Perlin,
    seed: u32,
}

impl PerlinTerrain {
    /// Creates a generator for the given seed.
    pub fn new(seed: u32) -> Self {
        PerlinTerrain {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    /// Whether the land column at a world position is topped with glowstone.
    pub fn has_lamp(&self, world_x: i32, world_z: i32) -> bool {
        let mut hash = (world_x as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (world_z as u32 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
            ^ u64::from(self.seed);
        hash ^= hash >> 31;
        hash = hash.wrapping_mul(0x94D0_49BB_1331_11EB);
        hash ^= hash >> 29;
        hash % GLOWSTONE_RARITY == 0
    }

    /// Height of the topmost solid block in the column at a world position.
    pub fn surface_height(&self, world_x: i32, world_z: i32) -> usize {
        let sample = self.perlin.get([
            world_x as f64 * PERLIN_SCALE_FACTOR,
            world_z as f64 * PERLIN_SCALE_FACTOR,
        ]);
        let height = BASE_HEIGHT + sample * HEIGHT_AMPLITUDE;
        height.clamp(1.0, (CHUNK_HEIGHT - 2) as f64) as usize
    }
}

impl TerrainGenerator for PerlinTerrain {
    fn fill(&self, position: ChunkPosition, blocks: &mut [BlockId]) {
        let width = CHUNK_WIDTH as i32;
        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                let world_x = position.x * width + x as i32;
                let world_z = position.y * width + z as i32;
                let surface = self.surface_height(world_x, world_z);
                let top = if self.has_lamp(world_x, world_z) {
                    BlockType::GLOWSTONE
                } else {
                    BlockType::GRASS
                };
                for y in 0..=surface {
                    let block = if y == surface && surface >= WATER_LEVEL {
                        top
                    } else if y + 4 > surface {
                        BlockType::DIRT
                    } else {
                        BlockType::STONE
                    };
                    blocks[block_index(x, y, z)] = block.id();
                }
                for y in surface + 1..WATER_LEVEL {
                    blocks[block_index(x, y, z)] = BlockType::WATER.id();
                }
            }
        }
    }
}
