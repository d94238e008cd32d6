use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to load calibration table: {0}")]
    CalibrationLoad(String),

    #[error("Failed to read input file: {0}")]
    InputRead(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to persist raster: {0}")]
    Persistence(String),

    #[error("Failed to list input directory: {0}")]
    Discovery(String),

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
