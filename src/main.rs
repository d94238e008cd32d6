use anyhow::Context;
use sat_thermal_rs::image_pipeline::{CorpusPipeline, PipelineConfig};
use sat_thermal_rs::logger;

use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting sat_thermal...");

    let config = PipelineConfig::builder().build()?;

    info!("Input: {}", config.input_dir.display());
    info!("Output: {}", config.output_dir.display());
    info!(
        "Target resolution: {}x{}",
        config.target.width, config.target.height
    );

    info!("Loading calibration table...");
    let calibration_path = config.calibration_path.clone();
    let pipeline = CorpusPipeline::new(config).with_context(|| {
        format!(
            "cannot start without calibration table '{}'",
            calibration_path.display()
        )
    })?;

    let report = pipeline.run().context("corpus conversion aborted")?;

    if report.failed() > 0 {
        warn!("Images failed (see errors above): {}", report.failed());
    }
    info!("Images converted to NPY: {}", report.processed());
    info!("Images held out: {}", report.excluded);
    info!(
        "Data saved in '{}'",
        pipeline.config().output_dir.display()
    );

    Ok(())
}
