//! # Mesher and Light Property Tests
//!
//! Properties that must hold for any chunk contents, checked over seeded
//! random chunks.

use voxel_streaming::engine_state::{
    rendering::meshing::{greedy_mesh, ChunkMeshes, MeshInput, MesherOptions, AO_LEVELS},
    voxels::{
        block::{
            block_side::{BlockSide, ChunkNeighbors},
            block_type::BlockType,
            BlockId, BlockRegistry, AIR,
        },
        chunk::{block_index, checked_block_index, CHUNK_HEIGHT, CHUNK_VOLUME, CHUNK_WIDTH},
        light::LightField,
    },
};

const SEEDS: [u64; 4] = [1, 7, 42, 20_240_517];

/// Hilly terrain with scattered water, glass and glowstone.
fn random_chunk(seed: u64) -> Vec<BlockId> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut blocks = vec![AIR; CHUNK_VOLUME];
    for x in 0..CHUNK_WIDTH {
        for z in 0..CHUNK_WIDTH {
            let height = rng.usize(20..40);
            for y in 0..height {
                blocks[block_index(x, y, z)] = BlockType::STONE.id();
            }
            if rng.u8(..4) == 0 {
                blocks[block_index(x, height, z)] = BlockType::WATER.id();
            }
        }
    }
    for _ in 0..200 {
        let index = block_index(rng.usize(..CHUNK_WIDTH), rng.usize(10..50), rng.usize(..CHUNK_WIDTH));
        blocks[index] = match rng.u8(..4) {
            0 => AIR,
            1 => BlockType::GLASS.id(),
            2 => BlockType::GLOWSTONE.id(),
            _ => BlockType::DIRT.id(),
        };
    }
    blocks
}

fn mesh_with(
    blocks: &[BlockId],
    light: &LightField,
    neighbors: ChunkNeighbors<&[BlockId]>,
    neighbor_light: ChunkNeighbors<&LightField>,
    options: &MesherOptions,
) -> ChunkMeshes {
    let registry = BlockRegistry::with_defaults();
    greedy_mesh(&MeshInput {
        blocks,
        light,
        neighbor_blocks: neighbors,
        neighbor_light,
        registry: &registry,
        options,
    })
}

fn mesh(blocks: &[BlockId], options: &MesherOptions) -> ChunkMeshes {
    let light = LightField::compute(blocks, &BlockRegistry::with_defaults());
    mesh_with(blocks, &light, [None; 4], [None; 4], options)
}

#[test]
fn meshing_is_deterministic() {
    let registry = BlockRegistry::with_defaults();
    for seed in SEEDS {
        let blocks = random_chunk(seed);
        let neighbor = random_chunk(seed + 1);
        let light = LightField::compute(&blocks, &registry);
        let neighbor_light = LightField::compute(&neighbor, &registry);
        let neighbors = [Some(neighbor.as_slice()), None, Some(neighbor.as_slice()), None];
        let neighbor_lights = [Some(&neighbor_light), None, Some(&neighbor_light), None];

        let first = mesh_with(&blocks, &light, neighbors, neighbor_lights, &MesherOptions::default());
        let second = mesh_with(&blocks, &light, neighbors, neighbor_lights, &MesherOptions::default());
        assert_eq!(first, second, "seed {seed}");
        assert!(first.validate().is_ok());
    }
}

#[test]
fn light_is_deterministic() {
    let registry = BlockRegistry::with_defaults();
    for seed in SEEDS {
        let blocks = random_chunk(seed);
        assert_eq!(
            LightField::compute(&blocks, &registry),
            LightField::compute(&blocks, &registry)
        );
    }
}

#[test]
fn remeshing_without_edits_is_idempotent() {
    let blocks = random_chunk(3);
    let options = MesherOptions::default();
    let first = mesh(&blocks, &options);
    let second = mesh(&blocks, &options);
    assert_eq!(first.opaque.interleaved(), second.opaque.interleaved());
    assert_eq!(first.transparent.indices, second.transparent.indices);
}

#[test]
fn ao_weights_are_categorical() {
    for seed in SEEDS {
        let meshes = mesh(&random_chunk(seed), &MesherOptions::default());
        for buffers in [&meshes.opaque, &meshes.transparent] {
            assert!(buffers.ao.iter().all(|ao| AO_LEVELS.contains(ao)), "seed {seed}");
        }
    }
}

#[test]
fn unoccluded_corners_are_fully_lit() {
    // A lone block has nothing around any of its corners.
    let mut blocks = vec![AIR; CHUNK_VOLUME];
    blocks[block_index(8, 100, 8)] = BlockType::WOOD.id();
    let meshes = mesh(&blocks, &MesherOptions::default());
    assert_eq!(meshes.opaque.quad_count(), 6);
    assert!(meshes.opaque.ao.iter().all(|&ao| ao == 1.0));
}

#[test]
fn solid_chunk_collapses_to_one_quad_per_side() {
    let blocks = vec![BlockType::STONE.id(); CHUNK_VOLUME];
    let with_floor = MesherOptions {
        emit_floor_faces: true,
        ..MesherOptions::default()
    };
    assert_eq!(mesh(&blocks, &with_floor).opaque.quad_count(), 6);
    assert_eq!(mesh(&blocks, &MesherOptions::default()).opaque.quad_count(), 5);
}

#[test]
fn solid_region_faces_are_fully_merged() {
    let mut blocks = vec![AIR; CHUNK_VOLUME];
    for x in 2..9 {
        for z in 3..7 {
            for y in 0..10 {
                blocks[block_index(x, y, z)] = BlockType::DIRT.id();
            }
        }
    }
    let with_floor = MesherOptions {
        emit_floor_faces: true,
        ..MesherOptions::default()
    };
    let meshes = mesh(&blocks, &with_floor);
    assert_eq!(meshes.opaque.quad_count(), 6);
    assert_eq!(meshes.opaque.vertex_count, 24);
    assert_eq!(meshes.opaque.index_count, 36);
}

#[test]
fn same_transparent_blocks_share_no_face() {
    let mut blocks = vec![AIR; CHUNK_VOLUME];
    for x in 4..8 {
        for y in 30..33 {
            blocks[block_index(x, y, 4)] = BlockType::WATER.id();
        }
    }
    let meshes = mesh(&blocks, &MesherOptions::default());
    assert!(meshes.opaque.is_empty());
    assert_eq!(meshes.transparent.quad_count(), 6);
}

#[test]
fn opaque_next_to_transparent_keeps_one_face() {
    let mut blocks = vec![AIR; CHUNK_VOLUME];
    blocks[block_index(4, 30, 4)] = BlockType::STONE.id();
    blocks[block_index(5, 30, 4)] = BlockType::GLASS.id();
    let meshes = mesh(&blocks, &MesherOptions::default());

    // The stone keeps all six faces, the glass loses the one towards the stone.
    assert_eq!(meshes.opaque.quad_count(), 6);
    assert_eq!(meshes.transparent.quad_count(), 5);
    let stone_faces_glass = meshes
        .opaque
        .normals
        .chunks(3)
        .step_by(4)
        .filter(|normal| *normal == [1.0, 0.0, 0.0])
        .count();
    assert_eq!(stone_faces_glass, 1);
}

fn neighbors_of(index: (i32, i32, i32)) -> impl Iterator<Item = (BlockSide, usize)> {
    let (x, y, z) = index;
    BlockSide::all().into_iter().filter_map(move |side| {
        let [dx, dy, dz] = side.offset();
        checked_block_index(x + dx, y + dy, z + dz).map(|neighbor| (side, neighbor))
    })
}

#[test]
fn light_falls_off_by_at_most_one_per_step() {
    let registry = BlockRegistry::with_defaults();
    for seed in SEEDS {
        let blocks = random_chunk(seed);
        let light = LightField::compute(&blocks, &registry);

        for x in 0..CHUNK_WIDTH as i32 {
            for z in 0..CHUNK_WIDTH as i32 {
                for y in 0..CHUNK_HEIGHT as i32 {
                    let Some(index) = checked_block_index(x, y, z) else {
                        continue;
                    };
                    if !registry.is_transparent(blocks[index]) {
                        continue;
                    }
                    for (side, neighbor) in neighbors_of((x, y, z)) {
                        if !registry.is_transparent(blocks[neighbor]) {
                            continue;
                        }
                        let here = light.packed(index);
                        let there = light.packed(neighbor);
                        assert!((here >> 4).abs_diff(there >> 4) <= 1, "sun at ({x}, {y}, {z})");
                        assert!((here & 0xF).abs_diff(there & 0xF) <= 1, "block light at ({x}, {y}, {z})");

                        // Full sun travels straight down without loss.
                        if side == BlockSide::BOTTOM && here >> 4 == 15 {
                            assert_eq!(there >> 4, 15, "below ({x}, {y}, {z})");
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn emitters_light_their_surroundings() {
    let registry = BlockRegistry::with_defaults();
    let mut blocks = vec![BlockType::STONE.id(); CHUNK_VOLUME];
    // A sealed cave with a glowstone in the middle.
    for x in 2..12 {
        for y in 20..24 {
            for z in 2..12 {
                blocks[block_index(x, y, z)] = AIR;
            }
        }
    }
    blocks[block_index(6, 21, 6)] = BlockType::GLOWSTONE.id();
    let light = LightField::compute(&blocks, &registry);

    assert_eq!(light.block_light(6, 21, 6), 15);
    assert_eq!(light.block_light(7, 21, 6), 14);
    assert_eq!(light.block_light(9, 21, 6), 12);
    assert_eq!(light.sunlight(7, 21, 6), 0);
    assert_eq!(light.block_light(6, 30, 6), 0);
}
