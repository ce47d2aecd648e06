//! Interleaved vertex format for uploading chunk meshes.
//!
//! The mesher produces parallel attribute arrays ([`MeshBuffers`]); renderers
//! that prefer a single interleaved vertex buffer convert them into
//! [`ChunkVertex`] records and upload the raw bytes.
//!
//! [`MeshBuffers`]: super::meshing::MeshBuffers

/// A vertex of a chunk mesh.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes), chunk-local
/// - Normal: 3x f32 (12 bytes)
/// - Texture Coordinates: 2x f32 (8 bytes), atlas space
/// - Ambient Occlusion: f32 (4 bytes), one of 0.25, 0.5, 0.75, 1.0
/// - Light: f32 (4 bytes), the packed sun/block light byte
///
/// Total size: 40 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkVertex {
    /// Position relative to the chunk origin
    pub position: [f32; 3],
    /// Outward face normal
    pub normal: [f32; 3],
    /// UV coordinates inside the texture atlas
    pub tex_coords: [f32; 2],
    /// Ambient occlusion weight
    pub ao: f32,
    /// Packed light byte (high nibble sun, low nibble block light)
    pub light: f32,
}

impl ChunkVertex {
    /// Size of one vertex in bytes, i.e. the stride of an interleaved buffer.
    pub const STRIDE: usize = std::mem::size_of::<ChunkVertex>();

    /// Reinterprets a vertex slice as raw bytes for upload.
    pub fn as_bytes(vertices: &[ChunkVertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_ten_tightly_packed_floats() {
        assert_eq!(ChunkVertex::STRIDE, 40);
        let vertices: [ChunkVertex; 2] = bytemuck::Zeroable::zeroed();
        assert_eq!(ChunkVertex::as_bytes(&vertices).len(), 80);
    }
}
