//! # Block Type Module
//!
//! Well-known block type identifiers. The registry is the source of truth for
//! block behavior; this enum only names the ids the default registry and the
//! bundled terrain generators use.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockId;

/// Enumerates the block types shipped with the default registry.
///
/// The discriminant is the on-disk and in-memory block id. `FromPrimitive`
/// allows converting raw ids coming out of a chunk array back into the enum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Never produces faces.
    AIR = 0,

    /// Plain opaque stone.
    STONE = 1,

    /// Opaque dirt, used below grass.
    DIRT = 2,

    /// Grass with distinct top, bottom and side textures.
    GRASS = 3,

    /// Opaque wood log.
    WOOD = 4,

    /// Transparent liquid. Adjacent water cells do not generate faces between them.
    WATER = 5,

    /// Transparent solid.
    GLASS = 6,

    /// Opaque block emitting block light at full strength.
    GLOWSTONE = 7,
}

impl BlockType {
    /// Converts a raw block id into a `BlockType`.
    ///
    /// Returns `None` for ids that are not one of the well-known types; such ids
    /// are still valid in chunk data and resolve through the registry.
    pub fn from_id(id: BlockId) -> Option<Self> {
        FromPrimitive::from_u8(id)
    }

    /// The raw id of this block type.
    pub fn id(self) -> BlockId {
        self as BlockId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_id() {
        assert_eq!(BlockType::from_id(1), Some(BlockType::STONE));
        assert_eq!(BlockType::from_id(BlockType::WATER.id()), Some(BlockType::WATER));
        assert_eq!(BlockType::from_id(200), None);
    }
}
