//! Image saving utilities.

use std::path::Path;

use image::{DynamicImage, RgbImage};
use ndarray::Axis;

use crate::error::{Error, Result};

use super::{ImageTensor, RGB_CHANNELS};

/// Save an RGB image to disk.
///
/// The format is inferred from the extension; JPEG output uses `quality`
/// (1-100), other formats ignore it.
///
/// # Errors
///
/// Returns an error if the file cannot be created or encoded.
pub fn save_image<P: AsRef<Path>>(img: &RgbImage, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            DynamicImage::ImageRgb8(img.clone())
                .write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// Convert a normalized NHWC generator output (1, H, W, 3) to an RGB image.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the tensor is not a single RGB image.
#[allow(clippy::cast_possible_truncation)]
pub fn tensor_to_image(tensor: &ImageTensor) -> Result<RgbImage> {
    let (batch, height, width, channels) = tensor.dim();

    if batch != 1 || channels != RGB_CHANNELS {
        return Err(Error::ShapeMismatch {
            expected: format!("(1, H, W, {RGB_CHANNELS})"),
            actual: format!("{:?}", tensor.shape()),
        });
    }

    // Logical iteration order is HWC regardless of memory layout
    let raw: Vec<u8> = tensor
        .index_axis(Axis(0), 0)
        .iter()
        .copied()
        .map(denormalize)
        .collect();

    // Safe: dimensions come from a tensor whose element count fits in memory
    RgbImage::from_raw(width as u32, height as u32, raw).ok_or_else(|| Error::ShapeMismatch {
        expected: format!("{width}x{height} RGB buffer"),
        actual: "undersized buffer".to_string(),
    })
}

/// Denormalize a value from [-1, 1] to [0, 255] with clamping.
///
/// Generator outputs can overshoot the tanh range slightly; clamping keeps
/// those pixels saturated instead of wrapping around.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn denormalize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    let scaled = (value + 1.0) * 127.5;
    scaled.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::normalize;
    use ndarray::Array4;

    #[test]
    fn test_denormalize() {
        assert_eq!(denormalize(-1.0), 0);
        assert_eq!(denormalize(1.0), 255);
    }

    #[test]
    fn test_denormalize_clamp() {
        assert_eq!(denormalize(-2.0), 0);
        assert_eq!(denormalize(2.0), 255);
        assert_eq!(denormalize(1.004), 255);
        assert_eq!(denormalize(f32::NEG_INFINITY), 0);
    }

    #[test]
    fn test_round_trip_exact() {
        for v in [0u8, 127, 128, 255] {
            assert_eq!(denormalize(normalize(v)), v);
        }
    }

    #[test]
    fn test_round_trip_all_values() {
        for v in 0..=255u8 {
            assert_eq!(denormalize(normalize(v)), v);
        }
    }

    #[test]
    fn test_tensor_to_image_dimensions() {
        let tensor = Array4::<f32>::zeros((1, 4, 6, 3));
        let img = tensor_to_image(&tensor).unwrap();

        assert_eq!(img.dimensions(), (6, 4));
        assert_eq!(img.get_pixel(0, 0).0, [128, 128, 128]);
    }

    #[test]
    fn test_tensor_to_image_pixel_order() {
        let mut tensor = Array4::<f32>::from_elem((1, 2, 2, 3), -1.0);
        tensor[[0, 1, 0, 0]] = 1.0;
        let img = tensor_to_image(&tensor).unwrap();

        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_tensor_to_image_rejects_wrong_channels() {
        let tensor = Array4::<f32>::zeros((1, 4, 4, 6));
        assert!(matches!(
            tensor_to_image(&tensor),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
