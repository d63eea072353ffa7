//! # `virtual-tryon`
//!
//! Shoe virtual try-on built on a pix2pix-style generator.
//!
//! A catalog shoe image and a foot photo are resized to 256x256, normalized to
//! [-1, 1], stacked into a single six-channel tensor (shoe first), and passed
//! through a pre-trained ONNX generator. The generator's output is mapped back
//! to an 8-bit RGB image.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use virtual_tryon::{load_model, Catalog, Config, TryOnService};
//!
//! # fn main() -> virtual_tryon::Result<()> {
//! let generator = Arc::new(load_model("models/pix2pix_tryon_G.onnx")?);
//! let service = TryOnService::new(generator, Config::default())?;
//!
//! let catalog = Catalog::default();
//! let request = catalog.request("shoe_1", "sample_1")?;
//! service.render(&request, "tryon.png")?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;

pub use catalog::{Catalog, FootSample, Shoe, TryOnRequest};
pub use error::{Error, Result};
pub use model::{load_model, Generator, ModelHandle, OnnxGenerator};
pub use pipeline::{try_on, Config, TryOnService};
