//! Image normalization module
//!
//! Decodes encoded images into fixed-size RGB8 pixel grids.

mod normalizer;
mod standard_normalizer;
pub mod types;

pub use normalizer::ImageNormalizer;
pub use standard_normalizer::StandardNormalizer;
pub use types::{RgbImageData, TargetResolution};
