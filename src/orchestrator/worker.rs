//! # Render Workers
//!
//! One OS thread per worker, fed through its own `std::sync::mpsc` channel.
//! Messages are handled strictly in arrival order, which is what lets the
//! orchestrator rely on send order alone: a `load-fields` sent before a
//! `render` is always applied first.
//!
//! Replies from every worker share one `futures` channel so the orchestrator
//! can await them. A panic inside a handler is caught and reported as a
//! `Failed` reply before the worker stops, so the orchestrator never waits on
//! a band that will not arrive.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use futures::channel::mpsc::UnboundedSender;
use log::{debug, error};
use web_time::Instant;

use super::message::{WorkerMessage, WorkerReply};
use crate::config::RenderRequest;
use crate::error::{RenderError, Result};
use crate::fields::snapshot::{FieldLayout, FieldSnapshot};
use crate::lighting::bake_shadows;
use crate::shading::{BandCamera, BandLayout, BlockPalette, Environment, MaterialLibrary, ModelTable, PathTracer};

/// Orchestrator side of one worker thread.
///
/// Dropping the channel closes the worker's inbox, which ends its loop.
#[derive(Debug)]
pub struct WorkerChannel {
    index: usize,
    sender: Sender<WorkerMessage>,
    _worker: JoinHandle<()>,
}

impl WorkerChannel {
    /// Spawns worker `index`.
    pub fn spawn(
        index: usize,
        environment: Environment,
        layout: FieldLayout,
        seed: u64,
        replies: UnboundedSender<WorkerReply>,
    ) -> Result<Self> {
        let mut state = WorkerState::new(index, environment, layout, seed);
        Self::spawn_with(index, replies, move |message| state.handle(message))
    }

    /// Spawns worker `index` around an arbitrary message handler.
    pub(crate) fn spawn_with<H>(
        index: usize,
        replies: UnboundedSender<WorkerReply>,
        mut handler: H,
    ) -> Result<Self>
    where
        H: FnMut(WorkerMessage) -> Option<WorkerReply> + Send + 'static,
    {
        let (sender, receiver) = channel::<WorkerMessage>();

        let worker_closure = move || {
            while let Ok(message) = receiver.recv() {
                let reply = match panic::catch_unwind(AssertUnwindSafe(|| handler(message))) {
                    Ok(Some(reply)) => reply,
                    Ok(None) => continue,
                    Err(payload) => {
                        let reason = panic_reason(payload.as_ref());
                        error!("Worker {} panicked: {}", index, reason);
                        WorkerReply::Failed {
                            worker: index,
                            reason,
                        }
                    }
                };
                let failed = matches!(reply, WorkerReply::Failed { .. });
                if replies.unbounded_send(reply).is_err() || failed {
                    break;
                }
            }
            debug!("Worker {} stopped", index);
        };

        let worker = thread::Builder::new()
            .name(format!("render-worker-{index}"))
            .spawn(worker_closure)?;

        Ok(WorkerChannel {
            index,
            sender,
            _worker: worker,
        })
    }

    /// Queues a message for this worker.
    pub fn send(&self, message: WorkerMessage) -> Result<()> {
        self.sender.send(message).map_err(|_| {
            error!("Worker {} disconnected", self.index);
            RenderError::WorkerDisconnected(self.index)
        })
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Everything one worker holds between messages.
struct WorkerState {
    index: usize,
    library: Arc<MaterialLibrary>,
    models: Arc<ModelTable>,
    fields: FieldSnapshot,
    layout: BandLayout,
    environment: Environment,
    rng: fastrand::Rng,
}

impl WorkerState {
    fn new(index: usize, environment: Environment, layout: FieldLayout, seed: u64) -> Self {
        WorkerState {
            index,
            library: Arc::default(),
            models: Arc::default(),
            fields: FieldSnapshot::empty(layout),
            layout: BandLayout::default(),
            environment,
            rng: fastrand::Rng::with_seed(seed.wrapping_add(index as u64)),
        }
    }

    fn handle(&mut self, message: WorkerMessage) -> Option<WorkerReply> {
        match message {
            WorkerMessage::LoadMaterials(library) => {
                debug!("Worker {} loaded {} block names", self.index, library.block_names.len());
                self.library = library;
                None
            }
            WorkerMessage::LoadModels(models) => {
                debug!("Worker {} loaded {} models", self.index, models.len());
                self.models = models;
                None
            }
            WorkerMessage::LoadFields(fields) => {
                self.fields = fields;
                None
            }
            WorkerMessage::UpdateCamera(layout) => {
                self.layout = layout;
                None
            }
            WorkerMessage::Render(request) => Some(WorkerReply::ImageData {
                worker: self.index,
                pixels: self.render(&request, false),
            }),
            WorkerMessage::FastRender(request) => Some(WorkerReply::ImageData {
                worker: self.index,
                pixels: self.render(&request, true),
            }),
            WorkerMessage::CalculateLighting { zone, sun, range } => Some(WorkerReply::LoadLighting {
                worker: self.index,
                shadows: bake_shadows(&self.fields.occupancy, &zone, sun, range),
            }),
        }
    }

    fn render(&mut self, request: &RenderRequest, fast: bool) -> Vec<u8> {
        let started = Instant::now();
        let palette = BlockPalette::new(&self.library, &self.models);
        let tracer = PathTracer::new(
            &self.fields.occupancy,
            self.fields.shadows.as_deref(),
            &palette,
            &self.environment,
        );
        let camera = BandCamera::new(&request.pose, self.layout);

        let pixels = if fast {
            tracer.render_band_fast(&camera, &request.sampling)
        } else {
            tracer.render_band(&mut self.rng, &camera, &request.sampling)
        };

        debug!(
            "Worker {} rendered rows {}..{} in {:?}",
            self.index,
            self.layout.first_row,
            self.layout.first_row + self.layout.rows,
            started.elapsed()
        );
        pixels
    }
}
