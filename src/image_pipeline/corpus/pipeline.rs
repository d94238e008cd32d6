use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, error, info, instrument, warn};

use crate::image_pipeline::{
    calibration::{CalibrationIndex, ColorLookup},
    capture_date::capture_timestamp_of,
    common::error::{PipelineError, Result},
    corpus::{
        config::PipelineConfig,
        outcome::{FileOutcome, RunReport},
    },
    decode::decode_temperatures,
    normalize::{ImageNormalizer, StandardNormalizer},
    raster::{NpyRasterWriter, RasterWriter, TemperatureRaster},
};

const PARTIAL_SUFFIX: &str = ".partial";

/// Converts every eligible image of the input directory into a temperature
/// raster in the output directory.
///
/// The lookup is built once and shared read-only by all files. Per-file
/// failures are recorded in the [`RunReport`] and never abort the run.
pub struct CorpusPipeline<L: ColorLookup, N: ImageNormalizer, W: RasterWriter> {
    lookup: L,
    normalizer: N,
    writer: W,
    config: PipelineConfig,
}

impl CorpusPipeline<CalibrationIndex, StandardNormalizer, NpyRasterWriter> {
    /// Loads the calibration table named by `config`. Fails before touching
    /// the output directory if the table is missing or malformed.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let lookup = CalibrationIndex::load(&config.calibration_path)?;
        Ok(Self {
            lookup,
            normalizer: StandardNormalizer,
            writer: NpyRasterWriter,
            config,
        })
    }
}

impl<L: ColorLookup, N: ImageNormalizer, W: RasterWriter> CorpusPipeline<L, N, W> {
    pub fn with_custom(lookup: L, normalizer: N, writer: W, config: PipelineConfig) -> Self {
        Self {
            lookup,
            normalizer,
            writer,
            config,
        }
    }

    /// Input files with exactly the configured extension, sorted by file name.
    ///
    /// Matching is case-sensitive: `scene.PNG` and `scene.png` would both
    /// map to `scene.npy`.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let input_dir = &self.config.input_dir;
        let discovery_error =
            |e: std::io::Error| PipelineError::Discovery(format!("{}: {}", input_dir.display(), e));

        let mut files = Vec::new();
        for entry in fs::read_dir(input_dir).map_err(discovery_error)? {
            let entry = entry.map_err(discovery_error)?;
            if !entry.file_type().map_err(discovery_error)?.is_file() {
                continue;
            }

            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == self.config.input_extension);
            if matches {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let name = input.file_name().unwrap_or(input.as_os_str());
        self.config
            .output_dir
            .join(Path::new(name).with_extension(self.writer.extension()))
    }

    /// Runs one file through date check, skip-if-done and conversion.
    #[instrument(skip(self, path), fields(file = %path.display()))]
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        if let (Some(cutoff), Some(captured)) = (self.config.holdout_cutoff, capture_timestamp_of(path)) {
            if captured >= cutoff {
                debug!(%captured, "Held out by capture date");
                return FileOutcome::Excluded(captured);
            }
        }

        let output_path = self.output_path_for(path);
        if output_path.exists() {
            debug!(output = %output_path.display(), "Output already present, skipping");
            return FileOutcome::AlreadyDone(output_path);
        }

        match self.convert_file(path, &output_path) {
            Ok(()) => FileOutcome::Succeeded(output_path),
            Err(e) => {
                error!(file = %path.display(), error = %e, "Conversion failed");
                FileOutcome::Failed(e)
            }
        }
    }

    fn convert_file(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            fs::read(input_path).map_err(|e| {
                PipelineError::InputRead(format!("{}: {}", input_path.display(), e))
            })?
        };

        let grid = {
            let _span = tracing::info_span!("normalize", input_size = input_data.len()).entered();
            self.normalizer.normalize(&input_data, self.config.target)?
        };

        let target = self.config.target;
        if grid.width != target.width as usize || grid.height != target.height as usize {
            return Err(PipelineError::ImageDecode(format!(
                "normalized grid is {}x{}, expected {}x{}",
                grid.width, grid.height, target.width, target.height
            )));
        }

        let raster = {
            let _span = tracing::info_span!("decode", pixels = grid.pixel_count()).entered();
            decode_temperatures(&grid, &self.lookup)
        };

        {
            let _span = tracing::info_span!("persist").entered();
            self.persist(&raster, output_path)?;
        }

        Ok(())
    }

    /// Writes to a sibling temp file and renames it into place, so the final
    /// name only ever refers to a complete raster.
    fn persist(&self, raster: &TemperatureRaster, output_path: &Path) -> Result<()> {
        let persistence_error =
            |e: std::io::Error| PipelineError::Persistence(format!("{}: {}", output_path.display(), e));

        let file_name = output_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let partial_path = output_path.with_file_name(format!(
            ".{}.{}{}",
            file_name,
            std::process::id(),
            PARTIAL_SUFFIX
        ));

        let written = File::create(&partial_path)
            .map_err(persistence_error)
            .and_then(|file| {
                let mut output = BufWriter::new(file);
                self.writer.write_raster(raster, &mut output)?;
                output.flush().map_err(persistence_error)
            })
            .and_then(|()| fs::rename(&partial_path, output_path).map_err(persistence_error));

        if written.is_err() {
            let _ = fs::remove_file(&partial_path);
        }
        written
    }

    /// Removes `.*.partial` leftovers of interrupted writes.
    fn sweep_partials(&self) {
        let Ok(entries) = fs::read_dir(&self.config.output_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let is_partial = name
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX));
            if !is_partial {
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => warn!(file = %entry.path().display(), "Removed stale partial output"),
                Err(e) => warn!(file = %entry.path().display(), error = %e, "Cannot remove stale partial output"),
            }
        }
    }

    fn process_tracked(&self, path: &Path, progress: &AtomicUsize) -> FileOutcome {
        let outcome = self.process_file(path);
        if let FileOutcome::Succeeded(output) = &outcome {
            let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
            if done % self.config.progress_interval == 0 {
                info!(done, last = %output.display(), "Processing...");
            }
        }
        outcome
    }

    /// Processes the whole corpus and returns the aggregated report.
    ///
    /// Only discovery and output directory creation are fatal; everything
    /// else is isolated per file.
    #[instrument(skip(self), fields(input = %self.config.input_dir.display()))]
    pub fn run(&self) -> Result<RunReport> {
        let files = self.discover()?;
        info!(total = files.len(), "Discovered input images");
        match self.config.holdout_cutoff {
            Some(cutoff) => info!(%cutoff, "Only processing images captured before cutoff"),
            None => info!("Holdout filtering disabled"),
        }

        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            PipelineError::Persistence(format!("{}: {}", self.config.output_dir.display(), e))
        })?;

        self.sweep_partials();

        let progress = AtomicUsize::new(0);
        let outcomes: Vec<FileOutcome> = if self.config.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
                .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
            pool.install(|| {
                files
                    .par_iter()
                    .map(|path| self.process_tracked(path, &progress))
                    .collect()
            })
        } else {
            files
                .iter()
                .map(|path| self.process_tracked(path, &progress))
                .collect()
        };

        let mut report = RunReport::default();
        for (path, outcome) in files.into_iter().zip(outcomes) {
            report.record(path, outcome);
        }

        report.log_summary();
        Ok(report)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}
