//! # Voxel Streaming Entry Point
//!
//! Runs the headless streaming driver from the library.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

fn main() {
    voxel_streaming::run();
}
