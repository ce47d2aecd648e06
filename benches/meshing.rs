//! Benchmarks for the light pass and greedy meshing.
//!
//! Run with: cargo bench --bench meshing

use std::sync::Arc;

use cgmath::Point2;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use voxel_streaming::engine_state::{
    rendering::{
        meshing::{greedy_mesh, MeshInput, MesherOptions},
        tasks::MeshJob,
    },
    voxels::{
        block::{block_side::ChunkNeighbor, BlockRegistry},
        chunk::{
            chunk_creation::{PerlinTerrain, TerrainGenerator},
            VoxelChunk,
        },
        light::LightField,
    },
};

fn terrain_chunk(position: Point2<i32>) -> VoxelChunk {
    PerlinTerrain::new(42).generate(position)
}

fn benchmark_light(c: &mut Criterion) {
    let registry = BlockRegistry::with_defaults();
    let chunk = terrain_chunk(Point2::new(0, 0));

    c.bench_function("light_field_compute", |b| {
        b.iter(|| black_box(LightField::compute(black_box(chunk.blocks()), &registry)))
    });
}

fn benchmark_greedy_mesh(c: &mut Criterion) {
    let registry = BlockRegistry::with_defaults();
    let options = MesherOptions::default();
    let center = terrain_chunk(Point2::new(0, 0));
    let light = LightField::compute(center.blocks(), &registry);
    let neighbors: Vec<(VoxelChunk, LightField)> = ChunkNeighbor::all()
        .into_iter()
        .map(|neighbor| {
            let chunk = terrain_chunk(Point2::new(0, 0) + neighbor.offset());
            let light = LightField::compute(chunk.blocks(), &registry);
            (chunk, light)
        })
        .collect();

    let input = MeshInput {
        blocks: center.blocks(),
        light: &light,
        neighbor_blocks: [0, 1, 2, 3].map(|i| Some(neighbors[i].0.blocks())),
        neighbor_light: [0, 1, 2, 3].map(|i| Some(&neighbors[i].1)),
        registry: &registry,
        options: &options,
    };

    let mut group = c.benchmark_group("greedy_mesh");
    group.throughput(Throughput::Elements(1));
    group.bench_function("terrain_with_neighbors", |b| {
        b.iter(|| black_box(greedy_mesh(black_box(&input))))
    });
    group.finish();
}

fn benchmark_mesh_job(c: &mut Criterion) {
    let registry = Arc::new(BlockRegistry::with_defaults());
    let chunk = terrain_chunk(Point2::new(3, -2));
    let job = MeshJob {
        position: chunk.position,
        data_version: chunk.data_version(),
        blocks: chunk.blocks().into(),
        light: None,
        neighbor_blocks: Default::default(),
        neighbor_light: Default::default(),
        registry,
        options: MesherOptions::default(),
    };

    let mut group = c.benchmark_group("mesh_job");
    group.sample_size(20);
    group.bench_function("light_and_mesh", |b| {
        b.iter(|| black_box(job.clone().run()))
    });
    group.bench_function("cache_key", |b| b.iter(|| black_box(job.cache_key())));
    group.finish();
}

criterion_group!(benches, benchmark_light, benchmark_greedy_mesh, benchmark_mesh_job);
criterion_main!(benches);
