//! Temperature decoding
//!
//! Maps every pixel of a normalized grid through a [`ColorLookup`] and
//! reshapes the result into a [`TemperatureRaster`] of the same shape.

use half::f16;
use tracing::debug;

use crate::image_pipeline::calibration::ColorLookup;
use crate::image_pipeline::normalize::RgbImageData;
use crate::image_pipeline::raster::TemperatureRaster;

/// Decodes `grid` into temperatures with a single batched lookup.
///
/// The grid must hold exactly `width * height` RGB triples.
pub fn decode_temperatures<L: ColorLookup + ?Sized>(
    grid: &RgbImageData,
    lookup: &L,
) -> TemperatureRaster {
    debug_assert_eq!(grid.data.len(), grid.pixel_count() * 3);

    let points: Vec<[u8; 3]> = grid.pixels().collect();
    let temperatures = lookup.nearest(&points);
    debug_assert_eq!(temperatures.len(), points.len());

    debug!(
        pixels = points.len(),
        width = grid.width,
        height = grid.height,
        "Decoded temperatures"
    );

    TemperatureRaster {
        width: grid.width,
        height: grid.height,
        data: temperatures.into_iter().map(f16::from_f32).collect(),
    }
}
