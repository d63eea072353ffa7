//! Try-on pipeline: preprocess, concatenate, generate, postprocess.

mod tryon;

pub use tryon::{concat_channels, try_on, Config, TryOnService};
