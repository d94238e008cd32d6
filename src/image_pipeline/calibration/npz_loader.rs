//! Calibration table reader for NumPy `.npz` archives.
//!
//! The archive holds two arrays:
//! - `rgb`: shape `(N, 3)`, channel intensities in `0..=255`
//! - `temp`: shape `(N,)`, temperatures
//!
//! The integer and float dtypes NumPy commonly produces for these arrays are
//! all accepted and converted on load.

use std::fs::File;
use std::path::Path;

use ndarray::{Array, Array1, Array2, Dimension, Ix1, Ix2};
use ndarray_npy::{NpzReader, ReadNpzError, ReadableElement};
use tracing::debug;

use crate::image_pipeline::calibration::table::CalibrationTable;
use crate::image_pipeline::common::error::{PipelineError, Result};

const COLORS_KEY: &str = "rgb";
const TEMPERATURES_KEY: &str = "temp";

pub fn load_npz_table(path: &Path) -> Result<CalibrationTable> {
    let file = File::open(path).map_err(|e| {
        PipelineError::CalibrationLoad(format!("{}: {}", path.display(), e))
    })?;

    let mut npz = NpzReader::new(file).map_err(|e| {
        PipelineError::CalibrationLoad(format!("{}: not a valid npz archive: {}", path.display(), e))
    })?;

    let rgb: Array2<f64> = read_as_f64::<Ix2>(&mut npz, COLORS_KEY).map_err(|e| {
        PipelineError::CalibrationLoad(format!(
            "{}: cannot read '{}' array: {}",
            path.display(),
            COLORS_KEY,
            e
        ))
    })?;

    let temp: Array1<f64> = read_as_f64::<Ix1>(&mut npz, TEMPERATURES_KEY).map_err(|e| {
        PipelineError::CalibrationLoad(format!(
            "{}: cannot read '{}' array: {}",
            path.display(),
            TEMPERATURES_KEY,
            e
        ))
    })?;

    debug!(
        colors_shape = ?rgb.shape(),
        temperatures_len = temp.len(),
        "Read calibration arrays"
    );

    let colors = colors_from_array(&rgb)
        .map_err(|e| PipelineError::CalibrationLoad(format!("{}: {}", path.display(), e)))?;
    let temperatures = temp.iter().map(|&t| t as f32).collect();

    CalibrationTable::new(colors, temperatures)
}

fn colors_from_array(rgb: &Array2<f64>) -> std::result::Result<Vec<[u8; 3]>, String> {
    if rgb.ncols() != 3 {
        return Err(format!(
            "'{}' must have 3 columns, found shape {:?}",
            COLORS_KEY,
            rgb.shape()
        ));
    }

    rgb.rows()
        .into_iter()
        .enumerate()
        .map(|(row, values)| {
            let mut color = [0u8; 3];
            for (channel, &value) in values.iter().enumerate() {
                if !value.is_finite() || !(0.0..=255.0).contains(&value) {
                    return Err(format!(
                        "'{}' row {} channel {} out of range: {}",
                        COLORS_KEY, row, channel, value
                    ));
                }
                color[channel] = value.round() as u8;
            }
            Ok(color)
        })
        .collect()
}

/// Reads `key` from the archive, accepting the dtypes NumPy commonly writes.
fn read_as_f64<D: Dimension>(
    npz: &mut NpzReader<File>,
    key: &str,
) -> std::result::Result<Array<f64, D>, ReadNpzError> {
    if let Ok(array) = read_member::<f64, D>(npz, key) {
        return Ok(array);
    }
    if let Ok(array) = read_member::<f32, D>(npz, key) {
        return Ok(array.mapv(f64::from));
    }
    if let Ok(array) = read_member::<u8, D>(npz, key) {
        return Ok(array.mapv(f64::from));
    }
    if let Ok(array) = read_member::<i32, D>(npz, key) {
        return Ok(array.mapv(f64::from));
    }
    read_member::<i64, D>(npz, key).map(|array| array.mapv(|v| v as f64))
}

/// `numpy.savez` stores members as `<key>.npy`; bare names are tried as well.
fn read_member<A: ReadableElement, D: Dimension>(
    npz: &mut NpzReader<File>,
    key: &str,
) -> std::result::Result<Array<A, D>, ReadNpzError> {
    match npz.by_name(&format!("{key}.npy")) {
        Ok(array) => Ok(array),
        Err(ReadNpzError::Zip(_)) => npz.by_name(key),
        Err(e) => Err(e),
    }
}
