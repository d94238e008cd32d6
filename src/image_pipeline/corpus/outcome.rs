//! Per-file outcomes and run summary

use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::info;

use crate::image_pipeline::common::error::PipelineError;

/// Final state of one discovered file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Raster written to the contained path
    Succeeded(PathBuf),
    /// Raster already present at the contained path; nothing recomputed
    AlreadyDone(PathBuf),
    /// Captured on or after the holdout cutoff
    Excluded(NaiveDateTime),
    /// Normalizing, decoding or persisting failed
    Failed(PipelineError),
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: PipelineError,
}

/// Aggregated result of a corpus run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub discovered: usize,
    pub newly_processed: usize,
    pub already_done: usize,
    pub excluded: usize,
    pub failures: Vec<FileFailure>,
}

impl RunReport {
    pub fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        self.discovered += 1;
        match outcome {
            FileOutcome::Succeeded(_) => self.newly_processed += 1,
            FileOutcome::AlreadyDone(_) => self.already_done += 1,
            FileOutcome::Excluded(_) => self.excluded += 1,
            FileOutcome::Failed(error) => self.failures.push(FileFailure { path, error }),
        }
    }

    /// Files whose raster exists after the run, whether new or reused.
    pub fn processed(&self) -> usize {
        self.newly_processed + self.already_done
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn log_summary(&self) {
        info!(
            discovered = self.discovered,
            processed = self.processed(),
            newly_processed = self.newly_processed,
            already_done = self.already_done,
            excluded = self.excluded,
            failed = self.failed(),
            "Run finished"
        );
    }
}
