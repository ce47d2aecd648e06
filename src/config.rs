//! # Engine Configuration
//!
//! Runtime settings loaded from JSON. Every field has a default, so a config
//! file only needs the values it changes:
//!
//! ```json
//! {
//!     "worker_count": 4,
//!     "streaming": { "render_distance": 8, "mesh_budget": 16 },
//!     "mesher": { "emit_floor_faces": true },
//!     "blocks": [{ "id": 20, "transparent": true, "emission": 10 }]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine_state::rendering::meshing::MesherOptions;
use crate::engine_state::voxels::block::{BlockDefinition, BlockRegistry, AIR};
use crate::error::{ConfigError, ConfigResult};

/// How far around the observer chunks are generated, meshed and kept.
///
/// Distances are in chunks and compared on squared chunk-grid distance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chunks within this distance are generated.
    pub render_distance: i32,
    /// Extra distance beyond `render_distance` before a chunk is unloaded.
    pub unload_margin: i32,
    /// Dirty chunks within this distance are queued for meshing.
    pub mesh_distance: i32,
    /// Chunks generated per frame while streaming.
    pub generation_budget: usize,
    /// Mesh jobs submitted per frame.
    pub mesh_budget: usize,
    /// Meshes kept in the input-keyed mesh cache. 0 disables the cache.
    pub mesh_cache_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        StreamingConfig {
            render_distance: 6,
            unload_margin: 2,
            mesh_distance: 5,
            generation_budget: 4,
            mesh_budget: 8,
            mesh_cache_capacity: 256,
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads for light and meshing. 0 uses the available parallelism.
    pub worker_count: usize,
    /// Seed of the terrain generator.
    pub terrain_seed: u32,
    /// Streaming distances and per-frame budgets.
    pub streaming: StreamingConfig,
    /// Mesher policy.
    pub mesher: MesherOptions,
    /// Block definitions applied on top of the built-in block types.
    pub blocks: Vec<BlockDefinition>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            worker_count: 0,
            terrain_seed: 1337,
            streaming: StreamingConfig::default(),
            mesher: MesherOptions::default(),
            blocks: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Reads and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        let streaming = &self.streaming;
        if streaming.render_distance < 0 || streaming.unload_margin < 0 {
            return Err(ConfigError::Invalid(
                "render_distance and unload_margin must not be negative".to_string(),
            ));
        }
        if streaming.mesh_distance < 0 || streaming.mesh_distance > streaming.render_distance {
            return Err(ConfigError::Invalid(format!(
                "mesh_distance must be within 0..={}",
                streaming.render_distance
            )));
        }
        if streaming.generation_budget == 0 || streaming.mesh_budget == 0 {
            return Err(ConfigError::Invalid(
                "generation_budget and mesh_budget must be at least 1".to_string(),
            ));
        }
        if self.mesher.atlas_tiles_per_row == 0 {
            return Err(ConfigError::Invalid(
                "atlas_tiles_per_row must be at least 1".to_string(),
            ));
        }
        if let Some(definition) = self.blocks.iter().find(|definition| definition.id == AIR) {
            return Err(ConfigError::Invalid(format!(
                "block id {} is reserved for air",
                definition.id
            )));
        }
        Ok(())
    }

    /// Worker count with 0 resolved to the machine's available parallelism.
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            return self.worker_count;
        }
        std::thread::available_parallelism()
            .map(|count| count.get())
            .unwrap_or(1)
    }

    /// Builds the block registry described by this configuration.
    pub fn block_registry(&self) -> BlockRegistry {
        BlockRegistry::from_definitions(&self.blocks)
    }
}
