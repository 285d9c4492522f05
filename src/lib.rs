#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Path Tracer
//!
//! A CPU path tracer for sparse voxel worlds, accelerated by baked distance
//! fields and parallelized across a pool of worker threads.
//!
//! ## Key Modules
//!
//! * `fields` - Sparse chunked and columnar volumes and their distance bake
//! * `raymarch` - Empty-space skipping plus exact grid traversal
//! * `lighting` - The baked sun-visibility volume
//! * `shading` - Materials, models, camera and the renderers
//! * `orchestrator` - Worker pool, broadcast and band assembly
//!
//! ## Data Flow
//!
//! A [`WorldSource`](world_source::WorldSource) is scanned over a box into the
//! occupancy fields, which are baked and shared with every worker. One worker
//! bakes the shadow map for the scanned box; after it is merged and shared
//! again, each worker renders one horizontal band and the orchestrator
//! stitches the bands into an RGBA frame.
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_path_tracer::config::{RenderRequest, RenderSettings};
//! use voxel_path_tracer::orchestrator::RenderOrchestrator;
//! use voxel_path_tracer::shading::{MaterialLibrary, ModelTable};
//! use voxel_path_tracer::world_source::{ScanZone, SparseWorld};
//! use cgmath::Point3;
//!
//! # fn main() -> voxel_path_tracer::error::Result<()> {
//! let mut library = MaterialLibrary::default();
//! library.register("air");
//! library.register("stone");
//! let mut world = SparseWorld::new();
//! world.set(Point3::new(0, 0, 0), 1);
//!
//! let mut orchestrator =
//!     RenderOrchestrator::new(4, RenderSettings::default(), library, ModelTable::default())?;
//! let zone = ScanZone::new(Point3::new(-8, -8, -8), Point3::new(8, 8, 8));
//! pollster::block_on(orchestrator.scan(&world, zone))?;
//! let image = pollster::block_on(orchestrator.fast_render(RenderRequest::default()))?;
//! image.save("frame.png")?;
//! # Ok(())
//! # }
//! ```

use log::{error, info};

pub mod config;
pub mod demo;
pub mod error;
pub mod fields;
pub mod lighting;
pub mod math;
pub mod orchestrator;
pub mod raymarch;
pub mod shading;
pub mod world_source;

/// Initializes `env_logger` on stdout, filtered by `RUST_LOG`.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
}

/// Entry point of the demo binary.
///
/// Reads an optional session file named by the first argument, then scans,
/// renders and saves one frame.
pub fn run() {
    init_logger();
    info!("Logger initialized");

    let session = match std::env::args().nth(1) {
        Some(path) => match config::SessionConfig::load(&path) {
            Ok(session) => session,
            Err(e) => {
                error!("Could not read session {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => config::SessionConfig::default(),
    };

    if let Err(e) = demo::run_session(session) {
        error!("Render failed: {}", e);
        std::process::exit(1);
    }
}
