//! The generator abstraction and its ONNX Runtime implementation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::ImageTensor;

/// Shoe and foot tensors stacked along the channel axis, (1, H, W, 6).
pub type CombinedTensor = Array4<f32>;

/// An image-to-image generator mapping a combined (1, H, W, 6) input to a
/// normalized (1, H, W, 3) image.
///
/// Implementations are loaded once and shared read-only between requests.
pub trait Generator: Send + Sync {
    /// Run a forward pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the forward pass fails.
    fn predict(&self, input: &CombinedTensor) -> Result<ImageTensor>;
}

/// Metadata describing a loaded model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Path the model was loaded from.
    pub path: PathBuf,
    /// Input tensor names.
    pub inputs: Vec<String>,
    /// Output tensor names.
    pub outputs: Vec<String>,
}

/// Generator backed by an ONNX Runtime session.
pub struct OnnxGenerator {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    info: ModelInfo,
}

impl OnnxGenerator {
    /// Load an ONNX model from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if the session cannot be built.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?
            .commit_from_file(path)
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?;

        let info = ModelInfo {
            path: path.to_path_buf(),
            inputs: session.inputs.iter().map(|i| i.name.clone()).collect(),
            outputs: session.outputs.iter().map(|o| o.name.clone()).collect(),
        };

        Ok(Self {
            session: Mutex::new(session),
            info,
        })
    }

    /// Metadata about the loaded model.
    #[must_use]
    pub const fn info(&self) -> &ModelInfo {
        &self.info
    }
}

impl Generator for OnnxGenerator {
    fn predict(&self, input: &CombinedTensor) -> Result<ImageTensor> {
        let input_value =
            Tensor::from_array(input.clone()).map_err(|source| Error::Inference { source })?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::LockPoisoned("inference session"))?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference { source })?;

        // Get first output
        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "generated image output".to_string(),
                actual: "no output".to_string(),
            })?;

        extract_array4(&output)
    }
}

/// Extract a 4D array from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_array4(value: &ort::value::ValueRef<'_>) -> Result<Array4<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Safe: tensor dimensions are always non-negative and within bounds
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    if dims.len() != 4 {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    }

    Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{dims:?}"),
            actual: "reshape failed".to_string(),
        }
    })
}
