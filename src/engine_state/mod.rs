//! # Engine State Module
//!
//! The core engine module that ties chunk streaming to a renderer.
//!
//! ## Key Components
//!
//! * `EngineState` - The explicit context object the frame loop drives
//! * `rendering` - Greedy meshing, mesh jobs and the renderer boundary
//! * `task_management` - The worker pool behind all background work
//! * `voxels` - Blocks, chunks, light and the chunk orchestrator
//!
//! ## Architecture
//!
//! There is no global world. Everything a frame needs lives in one
//! `EngineState`: the orchestrator owning the chunks and the worker pool, the
//! renderer receiving meshes, and the observer position streaming is centered
//! on. Several engines can coexist in one process.

use std::time::Duration;

use cgmath::Point3;
use log::info;
use web_time::Instant;

use crate::config::EngineConfig;
use crate::error::EngineError;

use rendering::RetainedMeshes;
use voxels::{
    block::BlockId,
    chunk::chunk_creation::{PerlinTerrain, TerrainGenerator, BASE_HEIGHT},
    world::{ChunkOrchestrator, FrameReport},
};

pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Height above the base terrain level the observer starts at.
const OBSERVER_START_ALTITUDE: f32 = 32.0;

/// The state container for one running engine.
///
/// # Examples
///
/// ```no_run
/// use voxel_streaming::{config::EngineConfig, engine_state::EngineState};
///
/// let mut engine = EngineState::new(&EngineConfig::default()).unwrap();
/// engine.load_initial();
/// loop {
///     engine.move_observer_by(cgmath::Vector3::new(0.5, 0.0, 0.0));
///     engine.tick();
/// }
/// ```
pub struct EngineState {
    /// Chunk streaming and meshing
    orchestrator: ChunkOrchestrator,
    /// Receives every mesh the orchestrator produces
    renderer: RetainedMeshes,
    /// World-space position chunks are streamed around
    observer: Point3<f32>,
    /// Number of frames run so far
    ticks: u64,
    /// Sum of all frame reports
    totals: FrameReport,
}

impl EngineState {
    /// Creates an engine with Perlin terrain seeded from the configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration, validated before use
    ///
    /// # Returns
    ///
    /// The engine, or the error that rejected the configuration or kept its
    /// worker pool from starting
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_generator(config, Box::new(PerlinTerrain::new(config.terrain_seed)))
    }

    /// Creates an engine with a custom terrain generator.
    pub fn with_generator(
        config: &EngineConfig,
        generator: Box<dyn TerrainGenerator>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let orchestrator = ChunkOrchestrator::new(config, generator)?;
        Ok(Self {
            orchestrator,
            renderer: RetainedMeshes::new(),
            observer: Point3::new(8.0, BASE_HEIGHT as f32 + OBSERVER_START_ALTITUDE, 8.0),
            ticks: 0,
            totals: FrameReport::default(),
        })
    }

    /// Synchronously generates every chunk within render distance of the observer.
    pub fn load_initial(&mut self) -> usize {
        self.orchestrator.load_initial(self.observer)
    }

    /// Runs one frame of streaming and meshing.
    pub fn tick(&mut self) -> FrameReport {
        let report = self.orchestrator.update(self.observer, &mut self.renderer);
        self.ticks += 1;
        accumulate(&mut self.totals, &report);
        report
    }

    /// Runs frames until no mesh job is outstanding and a frame starts no new work.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Upper bound on the time spent
    ///
    /// # Returns
    ///
    /// `true` if the engine settled before the timeout
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let report = self.tick();
            let started_work = report.generated + report.queued + report.cache_hits > 0;
            if !started_work && self.orchestrator.is_idle() {
                return true;
            }
            self.orchestrator
                .wait_for_work(deadline.saturating_duration_since(Instant::now()));
        }
        false
    }

    /// Moves the observer to a world-space position.
    pub fn set_observer(&mut self, position: Point3<f32>) {
        self.observer = position;
    }

    /// Moves the observer by a world-space offset.
    pub fn move_observer_by(&mut self, offset: cgmath::Vector3<f32>) {
        self.observer += offset;
    }

    /// Current observer position.
    pub fn observer(&self) -> Point3<f32> {
        self.observer
    }

    /// Writes a block at a world position. See [`ChunkOrchestrator::set_block`].
    pub fn set_block(&mut self, world_x: i32, world_y: i32, world_z: i32, block: BlockId) -> bool {
        self.orchestrator.set_block(world_x, world_y, world_z, block)
    }

    /// Reads a block at a world position.
    pub fn get_block(&self, world_x: i32, world_y: i32, world_z: i32) -> BlockId {
        self.orchestrator.get_block(world_x, world_y, world_z)
    }

    /// The chunk orchestrator.
    pub fn orchestrator(&self) -> &ChunkOrchestrator {
        &self.orchestrator
    }

    /// The renderer holding the current meshes.
    pub fn renderer(&self) -> &RetainedMeshes {
        &self.renderer
    }

    /// Number of frames run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sum of every frame report so far.
    pub fn totals(&self) -> FrameReport {
        self.totals
    }

    /// Stops the worker pool and logs a summary.
    pub fn shutdown(&mut self) {
        self.orchestrator.dispose();
        info!(
            "Engine stopped after {} frames: {:?}, {} chunks with geometry, {} vertex bytes, {:?}",
            self.ticks,
            self.totals,
            self.renderer.len(),
            self.renderer.vertex_bytes(),
            self.orchestrator.pool_stats()
        );
    }
}

fn accumulate(totals: &mut FrameReport, report: &FrameReport) {
    totals.generated += report.generated;
    totals.unloaded += report.unloaded;
    totals.queued += report.queued;
    totals.cache_hits += report.cache_hits;
    totals.applied += report.applied;
    totals.rejected += report.rejected;
    totals.failed += report.failed;
    totals.cancelled += report.cancelled;
}
