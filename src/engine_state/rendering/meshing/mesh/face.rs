//! Merged faces and the per-quad vertex attributes derived from them.
//!
//! The greedy sweep works in a rotated frame per face direction: the sweep
//! axis `a` and two tangent axes `u = (a + 1) % 3`, `v = (a + 2) % 3`. With
//! this choice `u × v` points along `+a`, so corners listed as
//! `(0,0) (1,0) (1,1) (0,1)` in `(u, v)` are counter-clockwise seen from `+a`.

use crate::engine_state::voxels::block::{block_side::BlockSide, BlockId, FaceTextures};

/// Ambient occlusion weight by number of occluding voxels around a corner.
pub const AO_LEVELS: [f32; 4] = [1.0, 0.75, 0.5, 0.25];

/// Corner offsets in tangent space, in vertex order.
pub const CORNER_OFFSETS: [(usize, usize); 4] = [(0, 0), (1, 0), (1, 1), (0, 1)];

/// Tangent axes `(u, v)` of a sweep axis.
#[inline]
pub fn tangent_axes(axis: usize) -> (usize, usize) {
    ((axis + 1) % 3, (axis + 2) % 3)
}

/// A rectangle of identical visible faces found by the greedy merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Direction the face points to.
    pub side: BlockSide,
    /// Coordinate of the source voxels along the sweep axis.
    pub layer: usize,
    /// Origin cell along the first tangent axis.
    pub u: usize,
    /// Origin cell along the second tangent axis.
    pub v: usize,
    /// Extent along the first tangent axis, in voxels.
    pub width: usize,
    /// Extent along the second tangent axis, in voxels.
    pub height: usize,
    /// Block the faces belong to.
    pub block: BlockId,
    /// Packed light of the voxels across the face.
    pub light: u8,
}

impl Face {
    /// Voxel coordinate of the origin cell.
    pub fn origin(&self) -> [i32; 3] {
        let axis = self.side.axis();
        let (u_axis, v_axis) = tangent_axes(axis);
        let mut origin = [0; 3];
        origin[axis] = self.layer as i32;
        origin[u_axis] = self.u as i32;
        origin[v_axis] = self.v as i32;
        origin
    }

    /// The four corner positions in vertex order.
    pub fn corners(&self) -> [[f32; 3]; 4] {
        let axis = self.side.axis();
        let (u_axis, v_axis) = tangent_axes(axis);
        let plane = self.layer + usize::from(self.side.is_positive());
        CORNER_OFFSETS.map(|(cu, cv)| {
            let mut corner = [0.0; 3];
            corner[axis] = plane as f32;
            corner[u_axis] = (self.u + cu * self.width) as f32;
            corner[v_axis] = (self.v + cv * self.height) as f32;
            corner
        })
    }
}

/// Occlusion weight of one corner given which of its three neighbors are opaque.
///
/// Two opaque edge neighbors fully occlude the corner whatever the diagonal holds.
#[inline]
pub fn corner_ao(side1: bool, side2: bool, corner: bool) -> f32 {
    if side1 && side2 {
        return AO_LEVELS[3];
    }
    AO_LEVELS[usize::from(side1) + usize::from(side2) + usize::from(corner)]
}

/// Triangle indices for a quad, relative to its first vertex.
///
/// The quad is cut along the diagonal whose corners sum to the larger AO so
/// that interpolation does not produce a visible seam. Negative faces reverse
/// the winding so that every triangle faces outward.
pub fn quad_indices(side: BlockSide, ao: [f32; 4]) -> [u32; 6] {
    let [a, b, c, d, e, f] = if ao[0] + ao[2] >= ao[1] + ao[3] {
        [0, 1, 2, 0, 2, 3]
    } else {
        [0, 1, 3, 1, 2, 3]
    };
    if side.is_positive() {
        [a, b, c, d, e, f]
    } else {
        [a, c, b, d, f, e]
    }
}

/// The atlas tile a face direction uses.
pub fn face_tile(textures: &FaceTextures, side: BlockSide) -> u16 {
    match side {
        BlockSide::TOP => textures.top,
        BlockSide::BOTTOM => textures.bottom,
        _ => textures.side,
    }
}

/// UVs of the four corners with one atlas tile stretched over the whole quad.
///
/// On lateral faces the tile's vertical axis follows world Y, so textures
/// stay upright regardless of how the quad was merged.
pub fn atlas_uvs(tile: u16, tiles_per_row: u16, side: BlockSide) -> [[f32; 2]; 4] {
    let tiles_per_row = tiles_per_row.max(1);
    let tile_size = 1.0 / tiles_per_row as f32;
    let origin_s = (tile % tiles_per_row) as f32 * tile_size;
    let origin_t = (tile / tiles_per_row) as f32 * tile_size;
    CORNER_OFFSETS.map(|(cu, cv)| {
        // For X faces the first tangent axis is Y; everywhere else it is the second.
        let (s, t) = if side.axis() == 0 { (cv, cu) } else { (cu, cv) };
        [
            origin_s + s as f32 * tile_size,
            origin_t + (1 - t) as f32 * tile_size,
        ]
    })
}
