//! # Light Module
//!
//! Sunlight and block light for a single chunk, packed one byte per voxel:
//! the high nibble is sunlight (0-15) and the low nibble is block light (0-15).
//!
//! The field is always recomputed from scratch and never looks across the
//! chunk boundary. Continuity between chunks is approximated at mesh time,
//! where boundary faces read the neighbor chunk's own field.

use std::collections::VecDeque;

use super::block::block_side::BlockSide;
use super::block::{BlockId, BlockRegistry, MAX_LIGHT_LEVEL};
use super::chunk::{block_index, checked_block_index, CHUNK_HEIGHT, CHUNK_VOLUME, CHUNK_WIDTH};

/// Packed value of a voxel under open sky with no block light.
pub const FULL_SUNLIGHT: u8 = MAX_LIGHT_LEVEL << 4;

/// Packs a sunlight and a block light level into one byte.
#[inline]
pub fn pack_light(sun: u8, block: u8) -> u8 {
    (sun.min(MAX_LIGHT_LEVEL) << 4) | block.min(MAX_LIGHT_LEVEL)
}

/// Sunlight level of a packed light byte.
#[inline]
pub fn sunlight_of(packed: u8) -> u8 {
    packed >> 4
}

/// Block light level of a packed light byte.
#[inline]
pub fn block_light_of(packed: u8) -> u8 {
    packed & 0x0F
}

/// Packed light levels for every voxel of one chunk.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LightField {
    data: Box<[u8]>,
}

impl LightField {
    /// A field with no light anywhere.
    pub fn dark() -> Self {
        LightField {
            data: vec![0; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    /// Computes the light field of a chunk from its blocks.
    ///
    /// 1. Every column is lit with full sunlight from the top down to the first
    ///    opaque block.
    /// 2. Sunlight floods sideways and downwards from the lit frontier, losing
    ///    one level per step except straight down from level 15.
    /// 3. Block light floods out of every emitting block, losing one level per step.
    pub fn compute(blocks: &[BlockId], registry: &BlockRegistry) -> Self {
        let mut data = vec![0u8; CHUNK_VOLUME].into_boxed_slice();
        let mut queue = VecDeque::new();

        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                for y in (0..CHUNK_HEIGHT).rev() {
                    let index = block_index(x, y, z);
                    if !registry.is_transparent(blocks[index]) {
                        break;
                    }
                    data[index] = FULL_SUNLIGHT;
                }
            }
        }

        for index in 0..CHUNK_VOLUME {
            if sunlight_of(data[index]) == MAX_LIGHT_LEVEL
                && Self::is_sun_frontier(blocks, &data, registry, index)
            {
                queue.push_back(index);
            }
        }
        Self::flood_sunlight(blocks, &mut data, registry, &mut queue);

        for (index, &block) in blocks.iter().enumerate().take(CHUNK_VOLUME) {
            let emission = registry.emission(block);
            if emission > 0 {
                data[index] = pack_light(sunlight_of(data[index]), emission);
                queue.push_back(index);
            }
        }
        Self::flood_block_light(blocks, &mut data, registry, &mut queue);

        LightField { data }
    }

    fn is_sun_frontier(blocks: &[BlockId], data: &[u8], registry: &BlockRegistry, index: usize) -> bool {
        let (x, y, z) = Self::coordinates(index);
        BlockSide::all().into_iter().any(|side| {
            let [dx, dy, dz] = side.offset();
            checked_block_index(x + dx, y + dy, z + dz).is_some_and(|neighbor| {
                registry.is_transparent(blocks[neighbor])
                    && sunlight_of(data[neighbor]) < MAX_LIGHT_LEVEL
            })
        })
    }

    fn flood_sunlight(
        blocks: &[BlockId],
        data: &mut [u8],
        registry: &BlockRegistry,
        queue: &mut VecDeque<usize>,
    ) {
        while let Some(index) = queue.pop_front() {
            let level = sunlight_of(data[index]);
            let (x, y, z) = Self::coordinates(index);
            for side in BlockSide::all() {
                let [dx, dy, dz] = side.offset();
                let Some(neighbor) = checked_block_index(x + dx, y + dy, z + dz) else {
                    continue;
                };
                if !registry.is_transparent(blocks[neighbor]) {
                    continue;
                }
                let propagated = if side == BlockSide::BOTTOM && level == MAX_LIGHT_LEVEL {
                    MAX_LIGHT_LEVEL
                } else {
                    level.saturating_sub(1)
                };
                if propagated > sunlight_of(data[neighbor]) {
                    data[neighbor] = (propagated << 4) | block_light_of(data[neighbor]);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    fn flood_block_light(
        blocks: &[BlockId],
        data: &mut [u8],
        registry: &BlockRegistry,
        queue: &mut VecDeque<usize>,
    ) {
        while let Some(index) = queue.pop_front() {
            let level = block_light_of(data[index]);
            if level <= 1 {
                continue;
            }
            let (x, y, z) = Self::coordinates(index);
            for side in BlockSide::all() {
                let [dx, dy, dz] = side.offset();
                let Some(neighbor) = checked_block_index(x + dx, y + dy, z + dz) else {
                    continue;
                };
                if !registry.is_transparent(blocks[neighbor]) {
                    continue;
                }
                if level - 1 > block_light_of(data[neighbor]) {
                    data[neighbor] = pack_light(sunlight_of(data[neighbor]), level - 1);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    #[inline]
    fn coordinates(index: usize) -> (i32, i32, i32) {
        let y = index % CHUNK_HEIGHT;
        let column = index / CHUNK_HEIGHT;
        ((column / CHUNK_WIDTH) as i32, y as i32, (column % CHUNK_WIDTH) as i32)
    }

    /// Packed light at a flat index.
    #[inline]
    pub fn packed(&self, index: usize) -> u8 {
        self.data[index]
    }

    /// Packed light at a local coordinate, 0 outside the chunk.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> u8 {
        checked_block_index(x, y, z).map_or(0, |index| self.data[index])
    }

    /// Sunlight level at a local coordinate.
    pub fn sunlight(&self, x: i32, y: i32, z: i32) -> u8 {
        sunlight_of(self.get(x, y, z))
    }

    /// Block light level at a local coordinate.
    pub fn block_light(&self, x: i32, y: i32, z: i32) -> u8 {
        block_light_of(self.get(x, y, z))
    }

    /// The raw packed array.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
