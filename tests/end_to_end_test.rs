//! # End-to-End Meshing Test
//!
//! A stone slab (y = 0..9) in chunk (0, 0) with no neighbors, pushed through a
//! real worker pool: light is computed on the worker and the slab collapses to
//! one top quad plus four side walls.

use std::sync::Arc;
use std::time::Duration;

use cgmath::Point2;
use voxel_streaming::engine_state::{
    rendering::{
        meshing::MesherOptions,
        tasks::{Job, JobOutput, MeshJob, MeshWorker},
    },
    task_management::WorkerPool,
    voxels::{
        block::{block_type::BlockType, BlockRegistry},
        chunk::{
            chunk_creation::{FlatTerrain, TerrainGenerator},
            CHUNK_HEIGHT, CHUNK_WIDTH,
        },
        light::FULL_SUNLIGHT,
    },
};

const SLAB_HEIGHT: usize = 10;

fn slab_job() -> MeshJob {
    let chunk = FlatTerrain {
        height: SLAB_HEIGHT,
        block: BlockType::STONE.id(),
    }
    .generate(Point2::new(0, 0));

    MeshJob {
        position: chunk.position,
        data_version: chunk.data_version(),
        blocks: chunk.blocks().into(),
        light: None,
        neighbor_blocks: Default::default(),
        neighbor_light: Default::default(),
        registry: Arc::new(BlockRegistry::with_defaults()),
        options: MesherOptions::default(),
    }
}

#[test]
fn stone_slab_through_the_pool() {
    let mut pool = WorkerPool::new(2, Box::new(MeshWorker::new)).unwrap();
    let handle = pool.submit(Job::Mesh(slab_job()));

    let JobOutput::Mesh(result) = pool
        .wait_for(&handle, Duration::from_secs(10))
        .expect("mesh job finished in time")
        .expect("mesh job succeeded");

    assert_eq!(result.position, Point2::new(0, 0));

    // Light: full sun from the sky down to the slab surface, dark inside.
    let light = result.computed_light.expect("light computed on the worker");
    for x in 0..CHUNK_WIDTH as i32 {
        for z in 0..CHUNK_WIDTH as i32 {
            for y in SLAB_HEIGHT as i32..CHUNK_HEIGHT as i32 {
                assert_eq!(light.sunlight(x, y, z), 15, "air at ({x}, {y}, {z})");
            }
            for y in 0..SLAB_HEIGHT as i32 {
                assert_eq!(light.sunlight(x, y, z), 0, "stone at ({x}, {y}, {z})");
            }
        }
    }

    // Geometry: top + four walls, no floor.
    let opaque = &result.meshes.opaque;
    assert!(result.meshes.transparent.is_empty());
    assert_eq!(opaque.vertex_count, 20);
    assert_eq!(opaque.index_count, 30);
    assert_eq!(opaque.triangle_count(), 10);
    assert!(result.meshes.validate().is_ok());

    // Every face looks into sunlit air or an absent neighbor.
    assert!(opaque.light.iter().all(|&light| light == FULL_SUNLIGHT as f32));

    let top_vertices = opaque
        .normals
        .chunks(3)
        .zip(opaque.positions.chunks(3))
        .filter(|(normal, _)| *normal == [0.0, 1.0, 0.0])
        .map(|(_, position)| position)
        .collect::<Vec<_>>();
    assert_eq!(top_vertices.len(), 4);
    assert!(top_vertices.iter().all(|position| position[1] == SLAB_HEIGHT as f32));

    let no_floor = opaque
        .normals
        .chunks(3)
        .all(|normal| normal != [0.0, -1.0, 0.0]);
    assert!(no_floor);

    pool.dispose();
}

#[test]
fn stretched_uvs_span_the_merged_area() {
    let result = slab_job().run();
    let opaque = &result.meshes.opaque;
    let uvs: Vec<&[f32]> = opaque.uvs.chunks(2).collect();

    // Each quad's UVs stay inside one atlas tile and cover its full extent.
    let tile = 1.0 / MesherOptions::default().atlas_tiles_per_row as f32;
    for quad in uvs.chunks(4) {
        let (min_u, max_u) = quad.iter().fold((f32::MAX, f32::MIN), |(lo, hi), uv| {
            (lo.min(uv[0]), hi.max(uv[0]))
        });
        assert!((max_u - min_u - tile).abs() < 1e-6);
    }
}
