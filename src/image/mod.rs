//! Image loading, normalization, and saving utilities.

mod load;
mod save;

pub use load::{image_to_tensor, normalize, preprocess};
pub use save::{denormalize, save_image, tensor_to_image};

use ndarray::Array4;

/// Image tensor in NHWC format (batch, height, width, channels).
/// Values are normalized to [-1, 1], the range the generator was trained on.
pub type ImageTensor = Array4<f32>;

/// Side length of the square images the generator consumes and produces.
pub const MODEL_IMAGE_SIZE: u32 = 256;

/// Largest side length `preprocess` accepts.
pub const MAX_IMAGE_SIZE: u32 = 4096;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;
