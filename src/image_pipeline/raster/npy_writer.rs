use std::io::Write;

use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::raster::npy::encode_header;
use crate::image_pipeline::raster::types::TemperatureRaster;
use crate::image_pipeline::raster::writer::RasterWriter;

pub struct NpyRasterWriter;

impl RasterWriter for NpyRasterWriter {
    fn extension(&self) -> &'static str {
        "npy"
    }

    fn write_raster(&self, raster: &TemperatureRaster, output: &mut dyn Write) -> Result<()> {
        debug!("Encoding NPY raster: {}x{}", raster.width, raster.height);

        if raster.data.len() != raster.width * raster.height {
            return Err(PipelineError::Persistence(format!(
                "raster holds {} values, expected {}x{}",
                raster.data.len(),
                raster.width,
                raster.height
            )));
        }

        let mut buffer = encode_header(raster.height, raster.width);
        buffer.reserve(raster.data.len() * 2);
        for value in &raster.data {
            buffer.extend_from_slice(&value.to_le_bytes());
        }

        output.write_all(&buffer)?;

        debug!("NPY encoding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    #[test]
    fn test_written_size() {
        let raster = TemperatureRaster {
            width: 4,
            height: 3,
            data: vec![f16::from_f32(1.0); 12],
        };
        let mut out = Vec::new();
        NpyRasterWriter.write_raster(&raster, &mut out).unwrap();

        let header_len = encode_header(3, 4).len();
        assert_eq!(header_len % 64, 0);
        assert_eq!(out.len(), header_len + 12 * 2);
        assert_eq!(&out[header_len..header_len + 2], &f16::from_f32(1.0).to_le_bytes());
    }

    #[test]
    fn test_rejects_inconsistent_raster() {
        let raster = TemperatureRaster {
            width: 4,
            height: 3,
            data: vec![f16::ZERO; 5],
        };
        let mut out = Vec::new();
        let result = NpyRasterWriter.write_raster(&raster, &mut out);

        assert!(matches!(result, Err(PipelineError::Persistence(_))));
        assert!(out.is_empty());
    }
}
