//! Shoe try-on inference.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use ::image::RgbImage;
use ndarray::{concatenate, Axis};

use crate::catalog::TryOnRequest;
use crate::error::{Error, Result};
use crate::image::{self, ImageTensor, MODEL_IMAGE_SIZE, RGB_CHANNELS};
use crate::model::{CombinedTensor, Generator};

/// Configuration for the try-on pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Output JPEG quality (1-100).
    pub output_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_quality: 95,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}

/// Stack the shoe and foot tensors along the channel axis.
///
/// The generator was trained on shoe channels first and foot channels second;
/// the order must not change.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the two tensors differ in batch or
/// spatial size.
pub fn concat_channels(shoe: &ImageTensor, foot: &ImageTensor) -> Result<CombinedTensor> {
    concatenate(Axis(3), &[shoe.view(), foot.view()]).map_err(|err| Error::ShapeMismatch {
        expected: format!("matching shapes, shoe is {:?}", shoe.shape()),
        actual: format!("foot is {:?} ({err})", foot.shape()),
    })
}

/// Composite the shoe at `shoe_path` onto the foot at `foot_path`.
///
/// Images are processed at the generator's native 256x256 resolution.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] naming the first missing image (the shoe
/// is checked before the foot is read), or any decode, inference, or shape
/// error.
pub fn try_on<G, P, Q>(shoe_path: P, foot_path: Q, model: &G) -> Result<RgbImage>
where
    G: Generator + ?Sized,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let shoe = image::preprocess(shoe_path, MODEL_IMAGE_SIZE)?;
    let foot = image::preprocess(foot_path, MODEL_IMAGE_SIZE)?;

    let combined = concat_channels(&shoe, &foot)?;

    let output = model.predict(&combined)?;

    let side = MODEL_IMAGE_SIZE as usize;
    if output.shape() != [1, side, side, RGB_CHANNELS] {
        return Err(Error::ShapeMismatch {
            expected: format!("[1, {side}, {side}, {RGB_CHANNELS}]"),
            actual: format!("{:?}", output.shape()),
        });
    }

    image::tensor_to_image(&output)
}

/// Try-on service built once at startup and shared by every request.
pub struct TryOnService<G: ?Sized> {
    config: Config,
    generator: Arc<G>,
}

impl<G: Generator + ?Sized> TryOnService<G> {
    /// Create a service around an already loaded generator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(generator: Arc<G>, config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing try-on service with config: {config:?}");

        Ok(Self { config, generator })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Run a try-on for the selected shoe and foot sample.
    ///
    /// # Errors
    ///
    /// Returns an error if an input is missing or inference fails.
    pub fn try_on(&self, request: &TryOnRequest<'_>) -> Result<RgbImage> {
        tracing::info!(
            "Trying on {} ({}) with {}",
            request.shoe.name,
            request.shoe.id,
            request.foot.label()
        );

        let started = Instant::now();
        let result = try_on(
            &request.shoe.image_path,
            &request.foot.image_path,
            self.generator.as_ref(),
        )?;

        tracing::info!("Try-on complete in {:.2?}", started.elapsed());
        Ok(result)
    }

    /// Run a try-on and save the result.
    ///
    /// Nothing is written if the try-on fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the try-on fails or the output cannot be saved.
    pub fn render<P: AsRef<Path>>(
        &self,
        request: &TryOnRequest<'_>,
        output_path: P,
    ) -> Result<RgbImage> {
        let output_path = output_path.as_ref();
        let result = self.try_on(request)?;

        tracing::info!("Saving output to: {}", output_path.display());
        image::save_image(&result, output_path, self.config.output_quality)?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{s, Array4};

    use super::*;

    #[test]
    fn test_config_default_is_valid() {
        let config = Config::default();
        assert_eq!(config.output_quality, 95);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let bad_quality = Config {
            output_quality: 0,
            ..Config::default()
        };
        assert!(matches!(
            bad_quality.validate(),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_concat_channels_order() {
        let shoe = Array4::<f32>::from_elem((1, 4, 4, 3), 0.5);
        let foot = Array4::<f32>::from_elem((1, 4, 4, 3), -0.5);

        let combined = concat_channels(&shoe, &foot).unwrap();

        assert_eq!(combined.shape(), &[1, 4, 4, 6]);
        assert!(combined.slice(s![.., .., .., 0..3]).iter().all(|&v| v == 0.5));
        assert!(combined.slice(s![.., .., .., 3..6]).iter().all(|&v| v == -0.5));
    }

    #[test]
    fn test_concat_channels_shape_mismatch() {
        let shoe = Array4::<f32>::zeros((1, 4, 4, 3));
        let foot = Array4::<f32>::zeros((1, 8, 8, 3));

        assert!(matches!(
            concat_channels(&shoe, &foot),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
