//! Generator models and how they are loaded.

mod generator;
mod handle;
mod loader;

pub use generator::{CombinedTensor, Generator, ModelInfo, OnnxGenerator};
pub use handle::ModelHandle;
pub use loader::{load_model, ModelCache, ModelSource};

/// Default location of the exported try-on generator.
pub const DEFAULT_MODEL_PATH: &str = "models/pix2pix_tryon_G.onnx";
