//! Calibration sample table types

use crate::image_pipeline::common::error::{PipelineError, Result};

/// A set of (color, temperature) calibration samples.
///
/// Colors and temperatures are parallel arrays: sample `i` is
/// `(colors[i], temperatures[i])`. Colors may repeat; lookups resolve
/// duplicates to the lowest ordinal.
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    colors: Vec<[u8; 3]>,
    temperatures: Vec<f32>,
}

impl CalibrationTable {
    pub fn new(colors: Vec<[u8; 3]>, temperatures: Vec<f32>) -> Result<Self> {
        if colors.len() != temperatures.len() {
            return Err(PipelineError::CalibrationLoad(format!(
                "{} colors but {} temperatures",
                colors.len(),
                temperatures.len()
            )));
        }

        if colors.is_empty() {
            return Err(PipelineError::CalibrationLoad(
                "calibration table is empty".to_string(),
            ));
        }

        Ok(Self {
            colors,
            temperatures,
        })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn temperatures(&self) -> &[f32] {
        &self.temperatures
    }

    pub(crate) fn into_parts(self) -> (Vec<[u8; 3]>, Vec<f32>) {
        (self.colors, self.temperatures)
    }
}
