//! # Render Errors
//!
//! Error type shared by every fallible operation in the crate.
//!
//! Sparse lookups never fail: a missing chunk, column or shadow sample reads as
//! its sentinel, and an unknown material renders as a placeholder. The variants
//! below are reserved for configuration mistakes and for a worker pool that can
//! no longer answer.

use thiserror::Error;

/// Errors surfaced by scanning, rendering and table construction.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A render or scan was requested from an orchestrator with an empty pool.
    #[error("no render workers are registered")]
    NoWorkers,

    /// A worker thread hung up before accepting a message.
    #[error("render worker {0} disconnected")]
    WorkerDisconnected(usize),

    /// A worker panicked while handling a message. It accepts nothing further.
    #[error("render worker {worker} panicked: {reason}")]
    WorkerPanicked {
        /// Index of the worker.
        worker: usize,
        /// The panic message.
        reason: String,
    },

    /// Every worker dropped its reply sender while results were still pending.
    #[error("reply channel closed before all workers reported")]
    RepliesClosed,

    /// A request that can never produce an image.
    #[error("invalid render request: {0}")]
    InvalidRequest(&'static str),

    /// A model element rotates around something other than x, y or z.
    #[error("unknown rotation axis `{0}`")]
    UnknownRotationAxis(String),

    /// A model names a parent that is not in the table.
    #[error("model `{model}` references missing parent `{parent}`")]
    MissingParentModel {
        /// The model being resolved.
        model: String,
        /// The parent it asked for.
        parent: String,
    },

    /// Following parents led back to a model already on the chain.
    #[error("model `{0}` has a cyclic parent chain")]
    CyclicModel(String),

    /// A texture did not contain exactly 16x16 texels.
    #[error("texture has {actual} texels, expected {expected}")]
    TextureSize {
        /// Required texel count.
        expected: usize,
        /// Texel count received.
        actual: usize,
    },

    /// Reading a configuration or output file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A configuration file was not valid JSON for its target type.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Encoding the rendered frame failed.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
