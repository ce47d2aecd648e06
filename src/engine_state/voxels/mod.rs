//! # Voxel Engine Core
//!
//! This module contains the voxel data side of the engine: what blocks are,
//! how they are stored, how light spreads through them and how chunks are
//! streamed around an observer.
//!
//! ## Architecture
//!
//! * **Block**: Block ids, per-id metadata and face/neighbor directions
//! * **Chunk**: Fixed-size column-major block arrays and terrain generation
//! * **Light**: Sunlight and block-light propagation within one chunk
//! * **World**: The orchestrator that loads, meshes and unloads chunks
//!
//! ## Data Flow
//!
//! 1. The orchestrator generates chunks around the observer
//! 2. Edits go through the orchestrator, which marks affected chunks dirty
//! 3. Dirty chunks are snapshotted into mesh jobs for the worker pool
//! 4. Completed meshes are handed to the renderer
//!
//! ## Thread Safety
//!
//! Chunks are only ever touched by the thread that owns the orchestrator.
//! Workers receive copies, so no chunk data is shared across threads.

pub mod block;
pub mod chunk;
pub mod light;
pub mod world;
