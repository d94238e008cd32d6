//! Raster persistence module
//!
//! Temperature rasters are stored as NumPy `.npy` files holding a
//! `(height, width)` array of little-endian `float16`.

mod npy;
mod npy_writer;
pub mod types;
mod writer;

pub use npy::read_raster;
pub use npy_writer::NpyRasterWriter;
pub use types::TemperatureRaster;
pub use writer::RasterWriter;
