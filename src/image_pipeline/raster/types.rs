//! Temperature raster types

use half::f16;

/// Decoded temperatures of one image, stored at reduced precision.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureRaster {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Row-major temperatures, `width * height` values
    pub data: Vec<f16>,
}

impl TemperatureRaster {
    /// Shape in NumPy order: `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f16> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }
}
