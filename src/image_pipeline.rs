//! Image processing pipeline module
//!
//! Converts false-color satellite images into calibrated temperature rasters,
//! with separate modules for calibration lookup, image normalization,
//! temperature decoding, raster persistence and corpus orchestration.

pub mod calibration;
pub mod capture_date;
pub mod common;
pub mod corpus;
pub mod decode;
pub mod normalize;
pub mod raster;

pub use common::{
    PipelineError,
    Result,
};

pub use calibration::{
    BruteForceLookup,
    CalibrationIndex,
    CalibrationTable,
    ColorLookup,
};

pub use capture_date::{capture_timestamp, capture_timestamp_of};

pub use normalize::{
    ImageNormalizer,
    RgbImageData,
    StandardNormalizer,
    TargetResolution,
};

pub use decode::decode_temperatures;

pub use raster::{
    read_raster,
    NpyRasterWriter,
    RasterWriter,
    TemperatureRaster,
};

pub use corpus::{
    CorpusPipeline,
    FileFailure,
    FileOutcome,
    PipelineConfig,
    PipelineConfigBuilder,
    RunReport,
};
