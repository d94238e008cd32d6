//! Minimal NumPy `.npy` (format 1.0) support for `float16` rasters.

use std::path::Path;

use half::f16;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::raster::types::TemperatureRaster;

pub(crate) const MAGIC: &[u8; 6] = b"\x93NUMPY";
pub(crate) const DESCR_F16_LE: &str = "<f2";

/// Magic, two version bytes, and the little-endian header length.
const PREAMBLE_LEN: usize = MAGIC.len() + 2 + 2;
const HEADER_ALIGNMENT: usize = 64;

/// Builds the complete format 1.0 preamble and header for a C-order
/// `float16` array of the given shape.
pub(crate) fn encode_header(rows: usize, cols: usize) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': ({}, {}), }}",
        DESCR_F16_LE, rows, cols
    );

    // Header text ends with '\n' and is space padded so the data is aligned.
    let unpadded = PREAMBLE_LEN + dict.len() + 1;
    let padding = (HEADER_ALIGNMENT - unpadded % HEADER_ALIGNMENT) % HEADER_ALIGNMENT;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(PREAMBLE_LEN + header_len);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat_n(b' ', padding));
    out.push(b'\n');
    out
}

/// Reads a raster previously written by [`NpyRasterWriter`](super::NpyRasterWriter).
///
/// Only 2-D, C-order, little-endian `float16` arrays are accepted.
pub fn read_raster<P: AsRef<Path>>(path: P) -> Result<TemperatureRaster> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    decode(&bytes).map_err(|e| PipelineError::InputRead(format!("{}: {}", path.display(), e)))
}

fn decode(bytes: &[u8]) -> std::result::Result<TemperatureRaster, String> {
    if bytes.len() < PREAMBLE_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err("missing NPY magic".to_string());
    }

    let major = bytes[MAGIC.len()];
    let (header_len, header_start) = match major {
        1 => (
            u16::from_le_bytes([bytes[8], bytes[9]]) as usize,
            PREAMBLE_LEN,
        ),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err("truncated NPY preamble".to_string());
            }
            (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            )
        }
        other => return Err(format!("unsupported NPY version {}", other)),
    };

    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err("truncated NPY header".to_string());
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| "NPY header is not valid text".to_string())?;

    let descr = quoted_value(header, "descr").ok_or("NPY header has no descr")?;
    if descr != DESCR_F16_LE {
        return Err(format!("expected dtype {}, found {}", DESCR_F16_LE, descr));
    }

    if header_value(header, "fortran_order").is_some_and(|v| v.starts_with("True")) {
        return Err("Fortran-order arrays are not supported".to_string());
    }

    let shape = shape_value(header).ok_or("NPY header has no valid shape")?;
    let [rows, cols] = shape[..] else {
        return Err(format!("expected a 2-D array, found shape {:?}", shape));
    };

    let payload = &bytes[data_start..];
    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(2))
        .ok_or_else(|| format!("shape ({}, {}) is too large", rows, cols))?;
    if payload.len() != expected {
        return Err(format!(
            "expected {} bytes of data, found {}",
            expected,
            payload.len()
        ));
    }

    let data = payload
        .chunks_exact(2)
        .map(|b| f16::from_le_bytes([b[0], b[1]]))
        .collect();

    Ok(TemperatureRaster {
        width: cols,
        height: rows,
        data,
    })
}

/// Text following `'key':` in the header dict.
fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let marker = format!("'{}':", key);
    let start = header.find(&marker)? + marker.len();
    Some(header[start..].trim_start())
}

fn quoted_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let rest = header_value(header, key)?.strip_prefix('\'')?;
    let end = rest.find('\'')?;
    Some(&rest[..end])
}

fn shape_value(header: &str) -> Option<Vec<usize>> {
    let rest = header_value(header, "shape")?.strip_prefix('(')?;
    let end = rest.find(')')?;
    rest[..end]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| dim.parse().ok())
        .collect()
}
