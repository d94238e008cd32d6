use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raster::types::TemperatureRaster;

pub trait RasterWriter: Send + Sync {
    /// File extension of the produced artifacts, without the dot.
    fn extension(&self) -> &'static str;

    fn write_raster(&self, raster: &TemperatureRaster, output: &mut dyn Write) -> Result<()>;
}
