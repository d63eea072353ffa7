//! Custom error types for virtual-tryon.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the virtual-tryon library.
#[derive(Error, Debug)]
pub enum Error {
    /// An input image does not exist on disk.
    #[error("input image not found: {}", .path.display())]
    MissingInput { path: PathBuf },

    /// Failed to decode an image file.
    #[error("failed to load image from {}: {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {}: {source}", .path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The model artifact does not exist on disk.
    #[error("model artifact not found: {}", .path.display())]
    ModelNotFound { path: PathBuf },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {}: {source}", .path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// Failed to download a model artifact.
    #[error("failed to download model {name}: {source}")]
    ModelDownload {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failed to write a downloaded artifact into the cache.
    #[error("failed to write cached model {}: {source}", .path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create cache directory.
    #[error("failed to create cache directory {}: {source}", .path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// A lock guarding shared model state was poisoned by a panicking holder.
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    /// The generator could not produce an output for a reason outside the runtime.
    #[error("generator failed: {0}")]
    Generator(String),

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Catalog lookup for an identifier that is not registered.
    #[error("unknown {kind} '{id}'")]
    UnknownEntry { kind: &'static str, id: String },

    /// Catalog file could not be parsed.
    #[error("invalid catalog {}: {source}", .path.display())]
    Catalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for virtual-tryon operations.
pub type Result<T> = std::result::Result<T, Error>;
