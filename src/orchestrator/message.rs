//! Messages exchanged between the orchestrator and its workers.

use std::sync::Arc;

use cgmath::Vector3;

use crate::config::RenderRequest;
use crate::fields::snapshot::FieldSnapshot;
use crate::lighting::ShadowMap;
use crate::shading::{BandLayout, MaterialLibrary, ModelTable};
use crate::world_source::ScanZone;

/// Orchestrator to worker.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Materials, flat colors and the identifier to name table.
    LoadMaterials(Arc<MaterialLibrary>),
    /// Block models.
    LoadModels(Arc<ModelTable>),
    /// Occupancy, distance and shadow snapshot.
    LoadFields(FieldSnapshot),
    /// The band this worker renders.
    UpdateCamera(BandLayout),
    /// Path-trace the band.
    Render(RenderRequest),
    /// Single-bounce render of the band.
    FastRender(RenderRequest),
    /// Bake sun visibility over a zone.
    CalculateLighting {
        /// Voxels to bake.
        zone: ScanZone,
        /// Direction toward the sun.
        sun: Vector3<f32>,
        /// Shadow ray length.
        range: f32,
    },
}

/// Worker to orchestrator.
#[derive(Debug)]
pub enum WorkerReply {
    /// RGBA rows of the worker's band.
    ImageData {
        /// Index of the reporting worker.
        worker: usize,
        /// Row-major RGBA bytes.
        pixels: Vec<u8>,
    },
    /// Result of a lighting bake.
    LoadLighting {
        /// Index of the reporting worker.
        worker: usize,
        /// Baked samples.
        shadows: ShadowMap,
    },
    /// The worker panicked while handling a message and has stopped.
    Failed {
        /// Index of the reporting worker.
        worker: usize,
        /// The panic message.
        reason: String,
    },
}
