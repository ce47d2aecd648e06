//! # Block Module
//!
//! Block identifiers and the read-only metadata table consumed by the light
//! pass and the mesher. The table is built once (defaults plus configuration
//! overrides) and then shared immutably with every worker.

use serde::{Deserialize, Serialize};

use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in chunk arrays.
pub type BlockId = u8;

/// Number of addressable block ids. Every `BlockId` indexes the registry.
pub const MAX_BLOCK_ID: usize = BlockId::MAX as usize + 1;

/// The id of empty space.
pub const AIR: BlockId = BlockType::AIR as BlockId;

/// Maximum light level of either nibble.
pub const MAX_LIGHT_LEVEL: u8 = 15;

/// Texture atlas tile indices for the three face groups of a block.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceTextures {
    /// Tile used by the `+Y` face.
    pub top: u16,
    /// Tile used by the `-Y` face.
    pub bottom: u16,
    /// Tile used by the four lateral faces.
    pub side: u16,
}

impl FaceTextures {
    /// One tile for every face.
    pub const fn uniform(tile: u16) -> Self {
        FaceTextures {
            top: tile,
            bottom: tile,
            side: tile,
        }
    }
}

/// Per block type properties.
///
/// Unregistered ids resolve to [`BlockMetadata::default`], which is
/// transparent and non-solid so placeholder ids can never break the mesher.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockMetadata {
    /// Lets light through and does not hide the faces of its neighbors.
    pub transparent: bool,
    /// Participates in collision. Not used by meshing.
    pub solid: bool,
    /// Block light emitted by this block, 0..=15.
    pub emission: u8,
    /// Atlas tiles for the faces of this block.
    pub textures: FaceTextures,
}

impl Default for BlockMetadata {
    fn default() -> Self {
        BlockMetadata {
            transparent: true,
            solid: false,
            emission: 0,
            textures: FaceTextures::default(),
        }
    }
}

impl BlockMetadata {
    /// An opaque, solid block with the given textures.
    pub const fn opaque(textures: FaceTextures) -> Self {
        BlockMetadata {
            transparent: false,
            solid: true,
            emission: 0,
            textures,
        }
    }
}

/// A registry entry as it appears in configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    /// The block id this definition applies to.
    pub id: BlockId,
    /// Properties of the block.
    #[serde(flatten)]
    pub metadata: BlockMetadata,
}

/// The block metadata table, one entry per possible `BlockId`.
///
/// Lookups are plain array indexing, so they are safe to do in per-voxel loops.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockRegistry {
    entries: Box<[BlockMetadata]>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Creates a registry where every id, air included, is transparent and non-solid.
    pub fn new() -> Self {
        BlockRegistry {
            entries: vec![BlockMetadata::default(); MAX_BLOCK_ID].into_boxed_slice(),
        }
    }

    /// Creates a registry pre-populated with the well-known [`BlockType`]s.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(BlockType::STONE.id(), BlockMetadata::opaque(FaceTextures::uniform(0)));
        registry.register(BlockType::DIRT.id(), BlockMetadata::opaque(FaceTextures::uniform(1)));
        registry.register(
            BlockType::GRASS.id(),
            BlockMetadata::opaque(FaceTextures {
                top: 3,
                bottom: 1,
                side: 2,
            }),
        );
        registry.register(
            BlockType::WOOD.id(),
            BlockMetadata::opaque(FaceTextures {
                top: 5,
                bottom: 5,
                side: 4,
            }),
        );
        registry.register(
            BlockType::WATER.id(),
            BlockMetadata {
                transparent: true,
                solid: false,
                emission: 0,
                textures: FaceTextures::uniform(6),
            },
        );
        registry.register(
            BlockType::GLASS.id(),
            BlockMetadata {
                transparent: true,
                solid: true,
                emission: 0,
                textures: FaceTextures::uniform(7),
            },
        );
        registry.register(
            BlockType::GLOWSTONE.id(),
            BlockMetadata {
                emission: MAX_LIGHT_LEVEL,
                ..BlockMetadata::opaque(FaceTextures::uniform(8))
            },
        );
        registry
    }

    /// Builds the default registry and applies configured definitions on top.
    pub fn from_definitions(definitions: &[BlockDefinition]) -> Self {
        let mut registry = Self::with_defaults();
        for definition in definitions {
            registry.register(definition.id, definition.metadata);
        }
        registry
    }

    /// Sets the metadata for `id`. Emission is clamped to the light range.
    ///
    /// Air can not be redefined; it always stays empty and transparent.
    pub fn register(&mut self, id: BlockId, mut metadata: BlockMetadata) {
        if id == AIR {
            log::warn!("Ignoring attempt to redefine air");
            return;
        }
        metadata.emission = metadata.emission.min(MAX_LIGHT_LEVEL);
        self.entries[id as usize] = metadata;
    }

    /// Metadata for `id`.
    #[inline]
    pub fn get(&self, id: BlockId) -> &BlockMetadata {
        &self.entries[id as usize]
    }

    /// Whether light passes through `id`.
    #[inline]
    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.entries[id as usize].transparent
    }

    /// Whether `id` is a visible block that blocks light. Air is never opaque.
    #[inline]
    pub fn is_opaque(&self, id: BlockId) -> bool {
        !self.entries[id as usize].transparent
    }

    /// Block light emitted by `id`.
    #[inline]
    pub fn emission(&self, id: BlockId) -> u8 {
        self.entries[id as usize].emission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_default_to_transparent_non_solid() {
        let registry = BlockRegistry::with_defaults();
        let metadata = registry.get(250);
        assert!(metadata.transparent);
        assert!(!metadata.solid);
        assert_eq!(metadata.emission, 0);
    }

    #[test]
    fn defaults_cover_well_known_types() {
        let registry = BlockRegistry::with_defaults();
        assert!(registry.is_transparent(AIR));
        assert!(registry.is_opaque(BlockType::STONE.id()));
        assert!(registry.is_transparent(BlockType::WATER.id()));
        assert_eq!(registry.emission(BlockType::GLOWSTONE.id()), 15);
        assert_eq!(registry.get(BlockType::GRASS.id()).textures.top, 3);
    }

    #[test]
    fn register_clamps_emission_and_protects_air() {
        let mut registry = BlockRegistry::new();
        registry.register(
            9,
            BlockMetadata {
                emission: 40,
                ..BlockMetadata::default()
            },
        );
        assert_eq!(registry.emission(9), 15);

        registry.register(AIR, BlockMetadata::opaque(FaceTextures::uniform(1)));
        assert!(registry.is_transparent(AIR));
    }

    #[test]
    fn definitions_deserialize_flattened() {
        let json = r#"[{ "id": 12, "transparent": false, "emission": 7, "textures": { "top": 1, "bottom": 2, "side": 3 } }]"#;
        let definitions: Vec<BlockDefinition> = serde_json::from_str(json).unwrap();
        let registry = BlockRegistry::from_definitions(&definitions);
        assert!(registry.is_opaque(12));
        assert_eq!(registry.emission(12), 7);
        assert_eq!(registry.get(12).textures.side, 3);
        // Fields left out fall back to the defaults.
        assert!(!registry.get(12).solid);
    }
}
