//! Mesh buffers produced by the greedy mesher.
//!
//! Buffers are parallel attribute arrays (one entry per vertex per attribute)
//! plus a triangle index list. Each buffer reports its vertex and index counts
//! next to the raw arrays so the receiver can validate it before upload.

use crate::engine_state::rendering::vertex::ChunkVertex;
use crate::error::MeshValidationError;

/// Geometry for one draw pass of one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// Vertex positions, 3 floats per vertex, chunk-local
    pub positions: Vec<f32>,
    /// Vertex normals, 3 floats per vertex
    pub normals: Vec<f32>,
    /// Atlas UVs, 2 floats per vertex
    pub uvs: Vec<f32>,
    /// Ambient occlusion weight, 1 float per vertex
    pub ao: Vec<f32>,
    /// Packed light byte, 1 float per vertex
    pub light: Vec<f32>,
    /// Triangle list into the vertex arrays
    pub indices: Vec<u32>,
    /// Number of vertices described by the attribute arrays
    pub vertex_count: u32,
    /// Number of entries in `indices`
    pub index_count: u32,
}

/// The four corners of a quad and the attributes shared by them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadVertices {
    /// Corner positions in winding order.
    pub positions: [[f32; 3]; 4],
    /// Outward normal of the quad.
    pub normal: [f32; 3],
    /// Atlas UVs per corner.
    pub uvs: [[f32; 2]; 4],
    /// Ambient occlusion per corner.
    pub ao: [f32; 4],
    /// Packed light byte, uniform across the quad.
    pub light: f32,
    /// Two triangles over the corners, relative to the first corner.
    pub indices: [u32; 6],
}

impl MeshBuffers {
    /// Creates empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the buffers hold no geometry.
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Number of quads, assuming every quad was added with [`MeshBuffers::push_quad`].
    pub fn quad_count(&self) -> usize {
        self.vertex_count as usize / 4
    }

    /// Number of triangles in the index list.
    pub fn triangle_count(&self) -> usize {
        self.index_count as usize / 3
    }

    /// Appends one quad.
    pub fn push_quad(&mut self, quad: &QuadVertices) {
        let base = self.vertex_count;
        for corner in 0..4 {
            self.positions.extend_from_slice(&quad.positions[corner]);
            self.normals.extend_from_slice(&quad.normal);
            self.uvs.extend_from_slice(&quad.uvs[corner]);
            self.ao.push(quad.ao[corner]);
            self.light.push(quad.light);
        }
        self.indices.extend(quad.indices.iter().map(|index| base + index));
        self.vertex_count += 4;
        self.index_count += 6;
    }

    /// Checks that every array agrees with the reported counts and that all
    /// indices address an existing vertex.
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        let vertices = self.vertex_count as usize;
        let attributes: [(&'static str, usize, usize); 5] = [
            ("positions", self.positions.len(), 3),
            ("normals", self.normals.len(), 3),
            ("uvs", self.uvs.len(), 2),
            ("ao", self.ao.len(), 1),
            ("light", self.light.len(), 1),
        ];
        for (attribute, actual, stride) in attributes {
            if actual != vertices * stride {
                return Err(MeshValidationError::AttributeLength {
                    attribute,
                    expected: vertices * stride,
                    actual,
                });
            }
        }

        if self.indices.len() != self.index_count as usize {
            return Err(MeshValidationError::IndexCount {
                reported: self.index_count,
                actual: self.indices.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(MeshValidationError::IncompleteTriangle(self.indices.len()));
        }
        if let Some(&index) = self.indices.iter().find(|&&index| index >= self.vertex_count) {
            return Err(MeshValidationError::IndexOutOfRange {
                index,
                vertex_count: self.vertex_count,
            });
        }
        Ok(())
    }

    /// Converts the parallel arrays into interleaved vertices.
    ///
    /// The buffers must be valid; call [`MeshBuffers::validate`] first.
    pub fn interleaved(&self) -> Vec<ChunkVertex> {
        (0..self.vertex_count as usize)
            .map(|i| ChunkVertex {
                position: [
                    self.positions[i * 3],
                    self.positions[i * 3 + 1],
                    self.positions[i * 3 + 2],
                ],
                normal: [
                    self.normals[i * 3],
                    self.normals[i * 3 + 1],
                    self.normals[i * 3 + 2],
                ],
                tex_coords: [self.uvs[i * 2], self.uvs[i * 2 + 1]],
                ao: self.ao[i],
                light: self.light[i],
            })
            .collect()
    }
}

/// The complete mesh of one chunk, split by draw pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMeshes {
    /// Faces of opaque blocks.
    pub opaque: MeshBuffers,
    /// Faces of transparent blocks (water, glass).
    pub transparent: MeshBuffers,
}

impl ChunkMeshes {
    /// Validates both passes.
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        self.opaque.validate()?;
        self.transparent.validate()
    }

    /// Whether neither pass holds geometry.
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }
}
