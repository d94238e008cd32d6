use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::normalize::types::{RgbImageData, TargetResolution};

pub trait ImageNormalizer: Send + Sync {
    fn normalize(&self, data: &[u8], target: TargetResolution) -> Result<RgbImageData>;
}
