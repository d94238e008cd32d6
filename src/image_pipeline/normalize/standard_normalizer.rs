//! Image normalizer implementation using the image library.
//!
//! Any format enabled on the `image` dependency is accepted; the format is
//! guessed from the file contents rather than the extension.

use image::imageops::{self, FilterType};
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::normalize::normalizer::ImageNormalizer;
use crate::image_pipeline::normalize::types::{RgbImageData, TargetResolution};

/// Bilinear resampling. Its support widens when downscaling, so large crops
/// are averaged instead of point sampled.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

pub struct StandardNormalizer;

impl ImageNormalizer for StandardNormalizer {
    /// Decodes `data`, converts it to RGB8 and resizes it to `target`.
    ///
    /// Alpha is dropped, grayscale and palette images are expanded to three
    /// channels. Images already at the target size are passed through
    /// untouched so their exact colors survive.
    ///
    /// # Returns
    ///
    /// * `Ok(RgbImageData)` - Grid of exactly `target.width x target.height` pixels
    /// * `Err(PipelineError::ImageDecode)` - `data` is not a decodable image
    fn normalize(&self, data: &[u8], target: TargetResolution) -> Result<RgbImageData> {
        debug!("Decoding image, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| PipelineError::ImageDecode(e.to_string()))?;

        debug!("Decoded image: {}x{}", decoded.width(), decoded.height());

        let rgb = decoded.to_rgb8();
        let rgb = if rgb.dimensions() == (target.width, target.height) {
            rgb
        } else {
            imageops::resize(&rgb, target.width, target.height, RESIZE_FILTER)
        };

        Ok(RgbImageData {
            width: rgb.width() as usize,
            height: rgb.height() as usize,
            data: rgb.into_raw(),
        })
    }
}
