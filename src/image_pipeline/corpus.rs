//! Corpus conversion module
//!
//! Orchestrates discovery, holdout filtering, skip-if-done, decoding and
//! persistence across a directory of images.

mod config;
mod outcome;
mod pipeline;

#[cfg(test)]
mod tests;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use outcome::{FileFailure, FileOutcome, RunReport};
pub use pipeline::CorpusPipeline;
