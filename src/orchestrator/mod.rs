//! # Render Orchestration
//!
//! [`RenderOrchestrator`] owns a fixed pool of worker threads and sequences
//! everything that reaches them.
//!
//! ## Message Flow
//! 1. At startup every worker receives `load-materials`, `load-models`, its
//!    band through `update-camera`, and an empty `load-fields`.
//! 2. [`scan`](RenderOrchestrator::scan) populates and bakes the orchestrator's
//!    copy of the fields, broadcasts them, asks worker 0 to bake lighting over
//!    the scanned zone, waits for the result, merges it and broadcasts again.
//! 3. [`render`](RenderOrchestrator::render) and
//!    [`fast_render`](RenderOrchestrator::fast_render) send the request to
//!    every worker, wait until every band has reported, and stitch the bands
//!    together worker 0 first.
//!
//! Worker inboxes are FIFO, so a render sent after a broadcast always sees
//! that broadcast. No locks are shared with workers; snapshots travel as
//! `Arc`s and the orchestrator copies on write.
//!
//! ## Failures
//! A worker that panics reports `Failed` and stops. The operation waiting on it
//! returns [`RenderError::WorkerPanicked`], and every later operation returns
//! [`RenderError::WorkerDisconnected`] for that worker.
//!
//! ## Overlapping Calls
//! Every operation takes `&mut self`. A second scan or render cannot start on
//! the same orchestrator until the first has resolved.

pub mod band;
pub mod message;
pub mod scan;
pub mod worker;

use std::path::Path;
use std::sync::Arc;
use std::thread;

use bitvec::prelude::*;
use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use futures::StreamExt;
use log::{info, warn};
use web_time::Instant;

use crate::config::{RenderRequest, RenderSettings};
use crate::error::{RenderError, Result};
use crate::fields::snapshot::{FieldSnapshot, OccupancyFields};
use crate::lighting::ShadowMap;
use crate::shading::{BandLayout, MaterialLibrary, ModelTable};
use crate::world_source::{ScanZone, WorldSource};

use band::{assemble_bands, band_layouts};
use message::{WorkerMessage, WorkerReply};
use scan::{populate, ScanReport};
use worker::WorkerChannel;

/// A finished frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA bytes, top-left origin, alpha always 255.
    pub pixels: Vec<u8>,
}

impl RenderedImage {
    /// RGBA bytes of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Encodes the frame as a PNG.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        image::save_buffer(
            path,
            &self.pixels,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }
}

/// Coordinates the worker pool.
pub struct RenderOrchestrator {
    workers: Vec<WorkerChannel>,
    replies: UnboundedReceiver<WorkerReply>,
    settings: RenderSettings,
    library: Arc<MaterialLibrary>,
    occupancy: Arc<OccupancyFields>,
    shadows: Option<Arc<ShadowMap>>,
    bands: Vec<BandLayout>,
    lost: BitVec,
}

impl RenderOrchestrator {
    /// Starts `worker_count` workers and sends them their tables and bands.
    ///
    /// A pool of zero workers is allowed; every later operation then fails
    /// with [`RenderError::NoWorkers`].
    pub fn new(
        worker_count: usize,
        settings: RenderSettings,
        library: MaterialLibrary,
        models: ModelTable,
    ) -> Result<Self> {
        settings.validate()?;
        let (reply_sender, replies) = unbounded();

        let workers = (0..worker_count)
            .map(|index| {
                WorkerChannel::spawn(
                    index,
                    settings.environment,
                    settings.field_layout,
                    settings.seed,
                    reply_sender.clone(),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        drop(reply_sender);

        let library = Arc::new(library);
        let models = Arc::new(models);
        let occupancy = Arc::new(OccupancyFields::new(settings.field_layout));
        let bands = band_layouts(settings.width, settings.height, workers.len());
        let lost = bitvec![0; workers.len()];

        let orchestrator = RenderOrchestrator {
            workers,
            replies,
            settings,
            library,
            occupancy,
            shadows: None,
            bands,
            lost,
        };

        orchestrator.broadcast(|| WorkerMessage::LoadMaterials(Arc::clone(&orchestrator.library)))?;
        orchestrator.broadcast(|| WorkerMessage::LoadModels(Arc::clone(&models)))?;
        orchestrator.send_bands()?;
        orchestrator.broadcast_fields()?;

        info!(
            "Started {} render workers for a {}x{} frame",
            orchestrator.workers.len(),
            orchestrator.settings.width,
            orchestrator.settings.height
        );
        Ok(orchestrator)
    }

    /// Starts one worker per available hardware thread.
    pub fn with_available_parallelism(
        settings: RenderSettings,
        library: MaterialLibrary,
        models: ModelTable,
    ) -> Result<Self> {
        let parallelism = thread::available_parallelism();
        info!("Available parallelism: {:?}", parallelism);
        let worker_count = parallelism.map(|n| n.get()).unwrap_or(1);
        Self::new(worker_count, settings, library, models)
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Current settings.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// The orchestrator's copy of the fields.
    pub fn fields(&self) -> &OccupancyFields {
        &self.occupancy
    }

    /// The merged shadow map, absent before the first scan.
    pub fn shadows(&self) -> Option<&ShadowMap> {
        self.shadows.as_deref()
    }

    /// Changes the output size and sends every worker its new band.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let settings = RenderSettings {
            width,
            height,
            ..self.settings.clone()
        };
        settings.validate()?;
        self.settings = settings;
        self.bands = band_layouts(width, height, self.workers.len());
        self.send_bands()
    }

    /// Scans `zone` from `world`, bakes, lights and broadcasts the result.
    ///
    /// Resolves only once the shadow bake has been merged and re-broadcast,
    /// so any render issued afterwards sees lighting for the new zone.
    pub async fn scan<W: WorldSource + ?Sized>(&mut self, world: &W, zone: ScanZone) -> Result<ScanReport> {
        self.ensure_workers()?;
        let started = Instant::now();

        let fields = Arc::make_mut(&mut self.occupancy);
        let report = populate(fields, world, &self.library, &zone);
        fields.distances.bake();
        self.broadcast_fields()?;

        info!("Requesting lighting for {} voxels", zone.volume());
        self.workers[0].send(WorkerMessage::CalculateLighting {
            zone,
            sun: self.settings.environment.sun(),
            range: self.settings.shadow_range,
        })?;

        let baked = loop {
            match self.replies.next().await {
                Some(WorkerReply::LoadLighting { worker, shadows }) => {
                    info!("Received lighting from worker {}", worker);
                    break shadows;
                }
                Some(WorkerReply::ImageData { worker, .. }) => {
                    warn!("Ignoring image data from worker {} during a scan", worker);
                }
                Some(WorkerReply::Failed { worker, reason }) => return Err(self.lose(worker, reason)),
                None => return Err(RenderError::RepliesClosed),
            }
        };

        let shadows = Arc::make_mut(self.shadows.get_or_insert_with(Arc::default));
        let merged = shadows.merge(&baked);
        let shadow_columns = shadows.column_count();
        self.broadcast_fields()?;

        info!(
            "Scan finished in {:?}, merged {} shadow samples into {} columns",
            started.elapsed(),
            merged,
            shadow_columns
        );
        Ok(report)
    }

    /// Path-traces a frame.
    pub async fn render(&mut self, request: RenderRequest) -> Result<RenderedImage> {
        self.dispatch(request, false).await
    }

    /// Renders a frame with the single-bounce shadow-map shader.
    pub async fn fast_render(&mut self, request: RenderRequest) -> Result<RenderedImage> {
        self.dispatch(request, true).await
    }

    async fn dispatch(&mut self, request: RenderRequest, fast: bool) -> Result<RenderedImage> {
        self.ensure_workers()?;
        request.validate()?;
        let started = Instant::now();

        self.broadcast(|| {
            if fast {
                WorkerMessage::FastRender(request)
            } else {
                WorkerMessage::Render(request)
            }
        })?;

        let count = self.workers.len();
        let mut received = bitvec![0; count];
        let mut slices = vec![Vec::new(); count];
        while !received.all() {
            match self.replies.next().await {
                Some(WorkerReply::ImageData { worker, pixels }) => {
                    if worker >= count || received[worker] {
                        warn!("Ignoring unexpected image data from worker {}", worker);
                        continue;
                    }
                    received.set(worker, true);
                    slices[worker] = pixels;
                }
                Some(WorkerReply::LoadLighting { worker, .. }) => {
                    warn!("Ignoring lighting from worker {} during a render", worker);
                }
                Some(WorkerReply::Failed { worker, reason }) => return Err(self.lose(worker, reason)),
                None => return Err(RenderError::RepliesClosed),
            }
        }

        let pixels = assemble_bands(&self.bands, slices);
        info!(
            "{} {}x{} in {:?}",
            if fast { "Fast-rendered" } else { "Rendered" },
            self.settings.width,
            self.settings.height,
            started.elapsed()
        );
        Ok(RenderedImage {
            width: self.settings.width,
            height: self.settings.height,
            pixels,
        })
    }

    fn ensure_workers(&self) -> Result<()> {
        if self.workers.is_empty() {
            return Err(RenderError::NoWorkers);
        }
        match self.lost.first_one() {
            Some(worker) => Err(RenderError::WorkerDisconnected(worker)),
            None => Ok(()),
        }
    }

    /// Records a worker that stopped after a panic.
    fn lose(&mut self, worker: usize, reason: String) -> RenderError {
        if worker < self.lost.len() {
            self.lost.set(worker, true);
        }
        RenderError::WorkerPanicked { worker, reason }
    }

    fn broadcast<F: FnMut() -> WorkerMessage>(&self, mut message: F) -> Result<()> {
        self.workers.iter().try_for_each(|worker| worker.send(message()))
    }

    fn broadcast_fields(&self) -> Result<()> {
        let snapshot = FieldSnapshot {
            occupancy: Arc::clone(&self.occupancy),
            shadows: self.shadows.clone(),
        };
        self.broadcast(|| WorkerMessage::LoadFields(snapshot.clone()))
    }

    fn send_bands(&self) -> Result<()> {
        self.workers
            .iter()
            .zip(&self.bands)
            .try_for_each(|(worker, band)| worker.send(WorkerMessage::UpdateCamera(*band)))
    }
}
