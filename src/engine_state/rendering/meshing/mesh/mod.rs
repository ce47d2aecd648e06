//! Mesh generation for voxel chunks.
//!
//! This module converts a chunk snapshot into GPU-friendly mesh buffers. It
//! implements greedy meshing to reduce the number of vertices and faces by
//! combining coplanar faces with the same block and light.
//!
//! # Architecture
//! - [`MeshBuffers`]: parallel vertex attribute arrays and a triangle index list
//! - [`ChunkMeshes`]: the opaque and transparent buffers of one chunk
//! - [`Face`]: one merged rectangle found by the greedy sweep
//! - [`greedy_mesh`]: the mesher entry point, a pure function of [`MeshInput`]

use serde::{Deserialize, Serialize};

mod face;
mod greedy;
mod mesh;

pub use face::{atlas_uvs, corner_ao, quad_indices, Face, AO_LEVELS};
pub use greedy::{greedy_mesh, MeshInput};
pub use mesh::*;

/// Default number of tiles per atlas row.
pub const DEFAULT_ATLAS_TILES_PER_ROW: u16 = 16;

/// Policy switches for the mesher.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MesherOptions {
    /// Emit `-Y` faces for blocks at `y = 0`. The world floor is normally never
    /// visible, so these faces are skipped.
    pub emit_floor_faces: bool,
    /// Atlas tiles per row, used to map tile indices to UV rectangles.
    pub atlas_tiles_per_row: u16,
}

impl Default for MesherOptions {
    fn default() -> Self {
        MesherOptions {
            emit_floor_faces: false,
            atlas_tiles_per_row: DEFAULT_ATLAS_TILES_PER_ROW,
        }
    }
}
