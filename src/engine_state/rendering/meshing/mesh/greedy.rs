//! Greedy meshing implementation for voxel rendering.
//!
//! This module implements the greedy meshing algorithm which combines adjacent coplanar
//! faces with the same block and light into larger quads, significantly reducing the
//! number of vertices needed to render a chunk.
//!
//! For each of the six face directions the chunk is cut into slices perpendicular to
//! the face normal. Each slice produces a 2-D mask of visible faces, and the mask is
//! consumed rectangle by rectangle: grow along the first tangent axis while cells
//! match, then along the second while whole rows match.

use log::debug;
use web_time::Instant;

use crate::engine_state::voxels::{
    block::{
        block_side::{BlockSide, ChunkNeighbor, ChunkNeighbors},
        BlockId, BlockRegistry, AIR,
    },
    chunk::{checked_block_index, CHUNK_DIMENSIONS, CHUNK_HEIGHT, CHUNK_WIDTH},
    light::{LightField, FULL_SUNLIGHT},
};

use super::{
    face::{atlas_uvs, corner_ao, face_tile, quad_indices, tangent_axes, Face, CORNER_OFFSETS},
    mesh::{ChunkMeshes, MeshBuffers, QuadVertices},
    MesherOptions,
};

/// Everything the mesher reads, borrowed from a job snapshot.
///
/// Missing neighbors are treated as all air for visibility and occlusion and as
/// open sky for light.
#[derive(Clone, Copy, Debug)]
pub struct MeshInput<'a> {
    /// Blocks of the chunk being meshed.
    pub blocks: &'a [BlockId],
    /// Light field of the chunk being meshed.
    pub light: &'a LightField,
    /// Blocks of the lateral neighbors, indexed by [`ChunkNeighbor`].
    pub neighbor_blocks: ChunkNeighbors<&'a [BlockId]>,
    /// Light fields of the lateral neighbors, indexed by [`ChunkNeighbor`].
    pub neighbor_light: ChunkNeighbors<&'a LightField>,
    /// Block metadata table.
    pub registry: &'a BlockRegistry,
    /// Mesher policy switches.
    pub options: &'a MesherOptions,
}

/// Where a local coordinate ends up once lateral overflow is resolved.
enum Resolved {
    /// Inside this chunk.
    Local(usize),
    /// Inside the given neighbor, at a flat index.
    Neighbor(ChunkNeighbor, usize),
    /// Above the top of the world.
    Sky,
    /// Below the world or past a diagonal neighbor.
    Void,
}

impl<'a> MeshInput<'a> {
    fn resolve(&self, [x, y, z]: [i32; 3]) -> Resolved {
        let width = CHUNK_WIDTH as i32;
        if y >= CHUNK_HEIGHT as i32 {
            return Resolved::Sky;
        }
        if y < 0 {
            return Resolved::Void;
        }
        let neighbor = match (x, z) {
            (x, z) if (0..width).contains(&x) && (0..width).contains(&z) => None,
            (x, z) if x < 0 && (0..width).contains(&z) => Some(ChunkNeighbor::WEST),
            (x, z) if x >= width && (0..width).contains(&z) => Some(ChunkNeighbor::EAST),
            (x, z) if z < 0 && (0..width).contains(&x) => Some(ChunkNeighbor::NORTH),
            (x, z) if z >= width && (0..width).contains(&x) => Some(ChunkNeighbor::SOUTH),
            _ => return Resolved::Void,
        };
        let local_x = x.rem_euclid(width);
        let local_z = z.rem_euclid(width);
        match (neighbor, checked_block_index(local_x, y, local_z)) {
            (_, None) => Resolved::Void,
            (None, Some(index)) => Resolved::Local(index),
            (Some(neighbor), Some(index)) => Resolved::Neighbor(neighbor, index),
        }
    }

    /// Block at a local coordinate, `None` where no data exists.
    fn block_at(&self, position: [i32; 3]) -> Option<BlockId> {
        match self.resolve(position) {
            Resolved::Local(index) => Some(self.blocks[index]),
            Resolved::Neighbor(neighbor, index) => {
                self.neighbor_blocks[neighbor as usize].map(|blocks| blocks[index])
            }
            Resolved::Sky | Resolved::Void => None,
        }
    }

    /// Packed light at a local coordinate. Missing data is open sky.
    fn light_at(&self, position: [i32; 3]) -> u8 {
        match self.resolve(position) {
            Resolved::Local(index) => self.light.packed(index),
            Resolved::Neighbor(neighbor, index) => self.neighbor_light[neighbor as usize]
                .map_or(FULL_SUNLIGHT, |light| light.packed(index)),
            Resolved::Sky => FULL_SUNLIGHT,
            Resolved::Void => 0,
        }
    }

    fn occludes(&self, position: [i32; 3]) -> bool {
        self.block_at(position)
            .is_some_and(|block| self.registry.is_opaque(block))
    }

    /// Whether the face of `block` pointing into `across` is visible.
    fn face_visible(&self, block: BlockId, across: [i32; 3], side: BlockSide) -> bool {
        if side == BlockSide::BOTTOM && across[1] < 0 {
            return self.options.emit_floor_faces;
        }
        match self.block_at(across) {
            None => true,
            Some(other) => self.registry.is_transparent(other) && other != block,
        }
    }
}

#[inline]
fn step(mut position: [i32; 3], axis: usize, delta: i32) -> [i32; 3] {
    position[axis] += delta;
    position
}

/// Packs a mask cell. Zero means "no face".
#[inline]
fn mask_cell(block: BlockId, light: u8) -> u32 {
    ((block as u32) << 8) | light as u32
}

/// Fills `mask` with the visible faces of one slice.
fn build_mask(input: &MeshInput, side: BlockSide, layer: usize, mask: &mut [u32]) {
    let axis = side.axis();
    let (u_axis, v_axis) = tangent_axes(axis);
    let u_size = CHUNK_DIMENSIONS[u_axis];
    let offset = side.offset();

    for v in 0..CHUNK_DIMENSIONS[v_axis] {
        for u in 0..u_size {
            let mut position = [0i32; 3];
            position[axis] = layer as i32;
            position[u_axis] = u as i32;
            position[v_axis] = v as i32;

            let block = input.block_at(position).unwrap_or(AIR);
            let across = [
                position[0] + offset[0],
                position[1] + offset[1],
                position[2] + offset[2],
            ];
            mask[u + v * u_size] = if block != AIR && input.face_visible(block, across, side) {
                mask_cell(block, input.light_at(across))
            } else {
                0
            };
        }
    }
}

/// Consumes a mask into maximal rectangles of identical cells.
fn merge_mask(side: BlockSide, layer: usize, mask: &mut [u32], faces: &mut Vec<Face>) {
    let (u_axis, v_axis) = tangent_axes(side.axis());
    let u_size = CHUNK_DIMENSIONS[u_axis];
    let v_size = CHUNK_DIMENSIONS[v_axis];

    for v in 0..v_size {
        let mut u = 0;
        while u < u_size {
            let cell = mask[u + v * u_size];
            if cell == 0 {
                u += 1;
                continue;
            }

            let mut width = 1;
            while u + width < u_size && mask[u + width + v * u_size] == cell {
                width += 1;
            }

            let mut height = 1;
            'grow: while v + height < v_size {
                let row = (v + height) * u_size;
                for k in 0..width {
                    if mask[u + k + row] != cell {
                        break 'grow;
                    }
                }
                height += 1;
            }

            for row in v..v + height {
                mask[u + row * u_size..u + width + row * u_size].fill(0);
            }

            faces.push(Face {
                side,
                layer,
                u,
                v,
                width,
                height,
                block: (cell >> 8) as BlockId,
                light: (cell & 0xFF) as u8,
            });
            u += width;
        }
    }
}

/// AO of the four corners, sampled around the origin cell of the face.
fn face_ao(input: &MeshInput, face: &Face) -> [f32; 4] {
    let axis = face.side.axis();
    let (u_axis, v_axis) = tangent_axes(axis);
    let across = step(face.origin(), axis, face.side.offset()[axis]);

    CORNER_OFFSETS.map(|(cu, cv)| {
        let du = if cu == 0 { -1 } else { 1 };
        let dv = if cv == 0 { -1 } else { 1 };
        let side1 = input.occludes(step(across, u_axis, du));
        let side2 = input.occludes(step(across, v_axis, dv));
        let corner = input.occludes(step(step(across, u_axis, du), v_axis, dv));
        corner_ao(side1, side2, corner)
    })
}

fn emit_face(input: &MeshInput, face: &Face, meshes: &mut ChunkMeshes) {
    let metadata = input.registry.get(face.block);
    let ao = face_ao(input, face);
    let quad = QuadVertices {
        positions: face.corners(),
        normal: face.side.normal(),
        uvs: atlas_uvs(
            face_tile(&metadata.textures, face.side),
            input.options.atlas_tiles_per_row,
            face.side,
        ),
        ao,
        light: face.light as f32,
        indices: quad_indices(face.side, ao),
    };
    let buffers: &mut MeshBuffers = if metadata.transparent {
        &mut meshes.transparent
    } else {
        &mut meshes.opaque
    };
    buffers.push_quad(&quad);
}

/// Generates the opaque and transparent meshes of a chunk.
///
/// The output depends only on `input`: face directions are swept in
/// [`BlockSide::all`] order, slices bottom-up, and each mask row by row, so
/// equal inputs give bit-identical buffers.
///
/// # Arguments
/// * `input` - The chunk, its neighbors, light and block metadata
///
/// # Returns
/// The opaque and transparent buffers. Faces are routed by the transparency of
/// the block they belong to.
pub fn greedy_mesh(input: &MeshInput) -> ChunkMeshes {
    let start = Instant::now();
    let mut meshes = ChunkMeshes::default();
    let mut faces = Vec::new();
    let mut mask = Vec::new();

    for side in BlockSide::all() {
        let axis = side.axis();
        let (u_axis, v_axis) = tangent_axes(axis);
        mask.clear();
        mask.resize(CHUNK_DIMENSIONS[u_axis] * CHUNK_DIMENSIONS[v_axis], 0);

        for layer in 0..CHUNK_DIMENSIONS[axis] {
            build_mask(input, side, layer, &mut mask);
            merge_mask(side, layer, &mut mask, &mut faces);
        }
    }

    for face in &faces {
        emit_face(input, face, &mut meshes);
    }

    debug!(
        "Greedy meshing produced {} opaque and {} transparent quads in {:?}",
        meshes.opaque.quad_count(),
        meshes.transparent.quad_count(),
        start.elapsed()
    );
    meshes
}
