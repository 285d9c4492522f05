//! # Voxel Path Tracer Entry Point
//!
//! Renders one frame of procedural terrain. An optional JSON session file
//! (see `SessionConfig`) may be passed as the first argument.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- session.json
//! ```

fn main() {
    voxel_path_tracer::run();
}
