//! Corpus pipeline configuration types

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::normalize::TargetResolution;

/// Configuration for a corpus conversion run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory scanned for input images
    pub input_dir: PathBuf,
    /// Directory receiving one raster per processed image
    pub output_dir: PathBuf,
    /// `.npz` calibration table holding `rgb` and `temp` arrays
    pub calibration_path: PathBuf,
    /// Resolution every image is resized to before decoding
    pub target: TargetResolution,
    /// Images captured on or after this instant are held out.
    /// `None` disables date filtering.
    pub holdout_cutoff: Option<NaiveDateTime>,
    /// Extension of input files, matched exactly (case-sensitive)
    pub input_extension: String,
    /// Log a progress line every this many newly processed files
    pub progress_interval: usize,
    /// Number of files processed concurrently (1 = sequential)
    pub workers: usize,
}

fn midnight(year: i32, month: u32, day: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(0, 0, 0))
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("Recortes-satelitales"),
            output_dir: PathBuf::from("Datos_Temperatura_NPY"),
            calibration_path: PathBuf::from("calibracion_color_temp.npz"),
            target: TargetResolution::default(),
            holdout_cutoff: midnight(2025, 10, 1),
            input_extension: "png".to_string(),
            progress_interval: 100,
            workers: 1,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.width == 0 || self.target.height == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "target resolution must be non-zero, got {}x{}",
                self.target.width, self.target.height
            )));
        }

        if self.workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }

        if self.progress_interval == 0 {
            return Err(PipelineError::InvalidConfig(
                "progress interval must be at least 1".to_string(),
            ));
        }

        if self.input_extension.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "input extension must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    calibration_path: Option<PathBuf>,
    target: Option<TargetResolution>,
    holdout_cutoff: Option<Option<NaiveDateTime>>,
    input_extension: Option<String>,
    progress_interval: Option<usize>,
    workers: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(dir.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn calibration_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.calibration_path = Some(path.into());
        self
    }

    pub fn target(mut self, width: u32, height: u32) -> Self {
        self.target = Some(TargetResolution::new(width, height));
        self
    }

    pub fn holdout_cutoff(mut self, cutoff: Option<NaiveDateTime>) -> Self {
        self.holdout_cutoff = Some(cutoff);
        self
    }

    /// Holds out everything from midnight of `date` onwards.
    pub fn holdout_from_date(mut self, date: NaiveDate) -> Self {
        self.holdout_cutoff = Some(date.and_hms_opt(0, 0, 0));
        self
    }

    pub fn input_extension(mut self, extension: impl Into<String>) -> Self {
        self.input_extension = Some(extension.into());
        self
    }

    pub fn progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn build(self) -> Result<PipelineConfig> {
        let default = PipelineConfig::default();
        let config = PipelineConfig {
            input_dir: self.input_dir.unwrap_or(default.input_dir),
            output_dir: self.output_dir.unwrap_or(default.output_dir),
            calibration_path: self.calibration_path.unwrap_or(default.calibration_path),
            target: self.target.unwrap_or(default.target),
            holdout_cutoff: self.holdout_cutoff.unwrap_or(default.holdout_cutoff),
            input_extension: self
                .input_extension
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or(default.input_extension),
            progress_interval: self.progress_interval.unwrap_or(default.progress_interval),
            workers: self.workers.unwrap_or(default.workers),
        };
        config.validate()?;
        Ok(config)
    }
}
