//! # Shading
//!
//! Surfaces, shapes and the renderers that turn marched rays into pixels.
//!
//! - [`texture`], [`material`]: per-face surface descriptors.
//! - [`model`]: non-cubic block shapes.
//! - [`palette`]: identifier to material/color/model resolution.
//! - [`environment`]: sky and sun.
//! - [`camera`]: primary rays for a band of the frame.
//! - [`path_tracer`]: the full and single-bounce renderers.

pub mod camera;
pub mod environment;
pub mod material;
pub mod model;
pub mod palette;
pub mod path_tracer;
pub mod texture;

pub use camera::{BandCamera, BandLayout};
pub use environment::Environment;
pub use material::{Material, MaterialLibrary, Surface};
pub use model::ModelTable;
pub use palette::BlockPalette;
pub use path_tracer::PathTracer;
