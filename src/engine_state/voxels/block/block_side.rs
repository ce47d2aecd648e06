//! # Block Side Module
//!
//! This module defines the faces of a voxel block and the four lateral
//! neighbors of a chunk. Both are small `Copy` enums used as array indices in
//! the mesher and the orchestrator, replacing string keyed neighbor lookups.

use cgmath::Vector2;

/// Represents the six possible faces of a voxel block.
///
/// The discriminant encodes the axis (`value / 2`, 0 = X, 1 = Y, 2 = Z) and the
/// sign (`value % 2`, 0 = negative, 1 = positive) so the mesher can derive its
/// sweep axis without a lookup table.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The face pointing towards negative X
    LEFT = 0,

    /// The face pointing towards positive X
    RIGHT = 1,

    /// The face pointing towards negative Y
    BOTTOM = 2,

    /// The face pointing towards positive Y
    TOP = 3,

    /// The face pointing towards negative Z
    BACK = 4,

    /// The face pointing towards positive Z
    FRONT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in discriminant order.
    ///
    /// The mesher sweeps the faces in exactly this order, which is part of its
    /// deterministic output contract.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::BACK,
            BlockSide::FRONT,
        ]
    }

    /// The axis this face is perpendicular to (0 = X, 1 = Y, 2 = Z).
    pub fn axis(self) -> usize {
        self as usize / 2
    }

    /// Whether the face normal points along the positive axis.
    pub fn is_positive(self) -> bool {
        self as usize % 2 == 1
    }

    /// Unit step from a voxel to the voxel across this face.
    pub fn offset(self) -> [i32; 3] {
        let mut offset = [0; 3];
        offset[self.axis()] = if self.is_positive() { 1 } else { -1 };
        offset
    }

    /// The outward normal of the face.
    pub fn normal(self) -> [f32; 3] {
        let [x, y, z] = self.offset();
        [x as f32, y as f32, z as f32]
    }
}

/// The four lateral neighbors of a chunk.
///
/// Used as the index into [`ChunkNeighbors`], a fixed array that carries
/// per-neighbor data such as block arrays or light fields.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum ChunkNeighbor {
    /// The chunk at `cx - 1`
    WEST = 0,

    /// The chunk at `cx + 1`
    EAST = 1,

    /// The chunk at `cz - 1`
    NORTH = 2,

    /// The chunk at `cz + 1`
    SOUTH = 3,
}

/// Per-neighbor data indexed by `ChunkNeighbor as usize`.
pub type ChunkNeighbors<T> = [Option<T>; 4];

impl ChunkNeighbor {
    /// All lateral neighbors in index order.
    pub fn all() -> [ChunkNeighbor; 4] {
        [
            ChunkNeighbor::WEST,
            ChunkNeighbor::EAST,
            ChunkNeighbor::NORTH,
            ChunkNeighbor::SOUTH,
        ]
    }

    /// Offset in chunk-grid coordinates.
    pub fn offset(self) -> Vector2<i32> {
        match self {
            ChunkNeighbor::WEST => Vector2::new(-1, 0),
            ChunkNeighbor::EAST => Vector2::new(1, 0),
            ChunkNeighbor::NORTH => Vector2::new(0, -1),
            ChunkNeighbor::SOUTH => Vector2::new(0, 1),
        }
    }
}
