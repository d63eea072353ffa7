//! Image loading utilities.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, ImageError, ImageReader};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{ImageTensor, MAX_IMAGE_SIZE, RGB_CHANNELS};

/// Load an image from disk and convert it to a normalized tensor.
///
/// The image is:
/// 1. Loaded from the specified path
/// 2. Converted to RGB if necessary
/// 3. Stretched to `size`x`size` (aspect ratio is not preserved)
/// 4. Normalized to [-1, 1] range
/// 5. Returned as NHWC tensor (1, size, size, 3)
///
/// # Errors
///
/// Returns [`Error::MissingInput`] if the file does not exist,
/// [`Error::ImageLoad`] if it cannot be decoded, and
/// [`Error::InvalidParameter`] if `size` is zero or above [`MAX_IMAGE_SIZE`].
pub fn preprocess<P: AsRef<Path>>(path: P, size: u32) -> Result<ImageTensor> {
    let path = path.as_ref();

    check_size(size)?;

    if !path.is_file() {
        return Err(Error::MissingInput {
            path: path.to_path_buf(),
        });
    }

    // Sniff the format from the file's bytes; catalog images are often
    // saved under the wrong extension
    let img = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(ImageError::IoError)
        .and_then(ImageReader::decode)
        .map_err(|source| Error::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(
        "Preprocessing {} ({}x{} -> {size}x{size})",
        path.display(),
        img.width(),
        img.height()
    );

    image_to_tensor(&img, size)
}

/// Convert a `DynamicImage` to a normalized NHWC tensor of side `size`.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `size` is zero or above [`MAX_IMAGE_SIZE`].
pub fn image_to_tensor(img: &DynamicImage, size: u32) -> Result<ImageTensor> {
    check_size(size)?;

    // Bicubic, matching the PIL default the generator was trained with
    let rgb = img
        .resize_exact(size, size, FilterType::CatmullRom)
        .to_rgb8();

    let side = size as usize;

    // RGB8 raw buffers are row-major HWC, which is already the NHWC layout
    let data: Vec<f32> = rgb.into_raw().into_iter().map(normalize).collect();

    Array4::from_shape_vec((1, side, side, RGB_CHANNELS), data).map_err(|err| {
        Error::ShapeMismatch {
            expected: format!("(1, {side}, {side}, {RGB_CHANNELS})"),
            actual: err.to_string(),
        }
    })
}

fn check_size(size: u32) -> Result<()> {
    if !(1..=MAX_IMAGE_SIZE).contains(&size) {
        return Err(Error::InvalidParameter {
            name: "size".to_string(),
            reason: format!("must be between 1 and {MAX_IMAGE_SIZE}"),
        });
    }
    Ok(())
}

/// Normalize an 8-bit sample from [0, 255] to [-1, 1].
#[inline]
#[must_use]
pub fn normalize(value: u8) -> f32 {
    f32::from(value) / 127.5 - 1.0
}
