#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streaming
//!
//! Chunk meshing and lighting for block worlds: chunks are generated around
//! an observer, lit with sunlight and block light, turned into greedy meshes
//! on a pool of worker threads and handed to a renderer.
//!
//! ## Key Modules
//!
//! * `config` - JSON engine configuration
//! * `engine_state` - Chunks, light, meshing, the worker pool and the orchestrator
//! * `error` - Error types shared across the crate
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_streaming::run();
//! }
//! ```
//!
//! The bundled binary runs headless: the observer walks along the x axis,
//! digs into the terrain every few frames and each frame's report is logged.
//! Set `RUST_LOG=debug` to see per-job timings.

use std::env;
use std::time::Duration;

use cgmath::Vector3;
use log::{debug, error, info};

use config::EngineConfig;
use engine_state::{
    voxels::block::{block_type::BlockType, AIR},
    EngineState,
};
use error::EngineError;

pub mod config;
pub mod engine_state;
pub mod error;

/// Frames the headless driver runs.
const DRIVER_FRAMES: u64 = 600;
/// Observer displacement per frame, in blocks.
const OBSERVER_SPEED: f32 = 0.5;
/// Frames between two edits by the headless driver.
const EDIT_INTERVAL: u64 = 20;
/// Upper bound on how long one frame waits for workers.
const FRAME_WAIT: Duration = Duration::from_millis(16);

/// Runs the headless driver, reading an optional config path from the first argument.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    if let Err(err) = drive(env::args().nth(1)) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn drive(config_path: Option<String>) -> Result<(), EngineError> {
    let config = match config_path {
        Some(path) => {
            info!("Loading configuration from {}", path);
            EngineConfig::from_path(path)?
        }
        None => EngineConfig::default(),
    };
    info!(
        "Starting with {} workers, render distance {}, mesh distance {}",
        config.resolved_worker_count(),
        config.streaming.render_distance,
        config.streaming.mesh_distance
    );

    let mut engine = EngineState::new(&config)?;
    engine.load_initial();

    for frame in 0..DRIVER_FRAMES {
        engine.move_observer_by(Vector3::new(OBSERVER_SPEED, 0.0, 0.0));
        if frame % EDIT_INTERVAL == 0 {
            dig_below_observer(&mut engine);
        }

        let report = engine.tick();
        if !report.is_quiet() {
            info!("Frame {}: {:?}", frame, report);
        }
        if !engine.orchestrator().is_idle() {
            std::thread::sleep(FRAME_WAIT);
        }
    }

    engine.shutdown();
    Ok(())
}

/// Removes the highest non-air block under the observer.
fn dig_below_observer(engine: &mut EngineState) {
    let observer = engine.observer();
    let (x, z) = (observer.x.floor() as i32, observer.z.floor() as i32);
    let top = (0..observer.y as i32)
        .rev()
        .find(|&y| engine.get_block(x, y, z) != AIR);
    if let Some(y) = top {
        let block = engine.get_block(x, y, z);
        if engine.set_block(x, y, z, AIR) {
            match BlockType::from_id(block) {
                Some(block_type) => debug!("Dug {:?} at ({}, {}, {})", block_type, x, y, z),
                None => debug!("Dug block {} at ({}, {}, {})", block, x, y, z),
            }
        }
    }
}
