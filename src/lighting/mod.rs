//! # Lighting
//!
//! The baked sun-visibility volume and the pass that fills it. Baking runs on a
//! single worker after every scan; the result is merged into the orchestrator's
//! map and broadcast with the next field snapshot.

pub mod bake;
pub mod shadow_map;

pub use bake::bake_shadows;
pub use shadow_map::ShadowMap;
