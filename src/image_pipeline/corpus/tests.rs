#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::{Cursor, Write};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use half::f16;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use ndarray::{arr1, arr2};
    use ndarray_npy::NpzWriter;
    use tempfile::TempDir;

    use crate::image_pipeline::calibration::{CalibrationIndex, CalibrationTable};
    use crate::image_pipeline::common::error::{PipelineError, Result};
    use crate::image_pipeline::corpus::{CorpusPipeline, FileOutcome, PipelineConfig};
    use crate::image_pipeline::normalize::{ImageNormalizer, RgbImageData, TargetResolution};
    use crate::image_pipeline::raster::{read_raster, NpyRasterWriter, RasterWriter, TemperatureRaster};

    /// Treats the first three input bytes as the color of a uniform image.
    struct MockNormalizer;

    impl ImageNormalizer for MockNormalizer {
        fn normalize(&self, data: &[u8], target: TargetResolution) -> Result<RgbImageData> {
            if data.starts_with(b"corrupt") || data.len() < 3 {
                return Err(PipelineError::ImageDecode("Mock decode error".to_string()));
            }
            Ok(RgbImageData::filled(
                target.width as usize,
                target.height as usize,
                [data[0], data[1], data[2]],
            ))
        }
    }

    struct MockWriter {
        should_fail: bool,
        written: Arc<Mutex<Vec<TemperatureRaster>>>,
    }

    impl RasterWriter for MockWriter {
        fn extension(&self) -> &'static str {
            "npy"
        }

        fn write_raster(&self, raster: &TemperatureRaster, output: &mut dyn Write) -> Result<()> {
            // Leave bytes behind so a failed write would be visible as a partial file
            output.write_all(b"partial")?;
            if self.should_fail {
                return Err(PipelineError::Persistence("Mock encode error".to_string()));
            }
            self.written.lock().unwrap().push(raster.clone());
            Ok(())
        }
    }

    fn index() -> CalibrationIndex {
        let table = CalibrationTable::new(
            vec![[0, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]],
            vec![-80.0, -20.0, 5.0, 30.0],
        )
        .unwrap();
        CalibrationIndex::build(table)
    }

    struct Corpus {
        _dir: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    impl Corpus {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let input = dir.path().join("input");
            let output = dir.path().join("output");
            fs::create_dir(&input).unwrap();
            Self {
                _dir: dir,
                input,
                output,
            }
        }

        fn add(&self, name: &str, contents: &[u8]) -> PathBuf {
            let path = self.input.join(name);
            fs::write(&path, contents).unwrap();
            path
        }

        fn config(&self) -> PipelineConfig {
            PipelineConfig::builder()
                .input_dir(&self.input)
                .output_dir(&self.output)
                .target(8, 4)
                .build()
                .unwrap()
        }

        fn outputs(&self) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(&self.output)
                .unwrap()
                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    fn mock_pipeline(
        config: PipelineConfig,
    ) -> CorpusPipeline<CalibrationIndex, MockNormalizer, NpyRasterWriter> {
        CorpusPipeline::with_custom(index(), MockNormalizer, NpyRasterWriter, config)
    }

    fn encode_png(image: RgbImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_discovery_sorted_and_filtered() {
        let corpus = Corpus::new();
        corpus.add("b.png", b"\xff\x00\x00");
        corpus.add("a.png", b"\xff\x00\x00");
        corpus.add("c.PNG", b"\xff\x00\x00");
        corpus.add("c.txt", b"\xff\x00\x00");
        fs::create_dir(corpus.input.join("d.png")).unwrap();

        let pipeline = mock_pipeline(corpus.config());
        let files = pipeline.discover().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_extension_case_variants_do_not_share_an_output() {
        let corpus = Corpus::new();
        corpus.add("scene.PNG", b"\xff\x00\x00");
        corpus.add("scene.png", b"\x00\x00\xff");

        let report = mock_pipeline(corpus.config()).run().unwrap();

        assert_eq!(report.discovered, 1);
        assert_eq!(report.newly_processed, 1);
        assert_eq!(report.already_done, 0);
        assert_eq!(report.failed(), 0);
        assert_eq!(corpus.outputs(), vec!["scene.npy"]);

        let raster = read_raster(corpus.output.join("scene.npy")).unwrap();
        assert!(raster.data.iter().all(|&t| t == f16::from_f32(30.0)));
    }

    #[test]
    fn test_stale_partial_outputs_are_swept() {
        let corpus = Corpus::new();
        corpus.add("scene.png", b"\xff\x00\x00");
        fs::create_dir_all(&corpus.output).unwrap();
        fs::write(corpus.output.join(".scene.npy.123.partial"), b"half").unwrap();
        fs::write(corpus.output.join(".other.npy.456.partial"), b"half").unwrap();
        fs::write(corpus.output.join("notes.partial"), b"keep").unwrap();

        let report = mock_pipeline(corpus.config()).run().unwrap();

        assert_eq!(report.newly_processed, 1);
        assert_eq!(corpus.outputs(), vec!["notes.partial", "scene.npy"]);
    }

    #[test]
    fn test_missing_input_dir_is_discovery_error() {
        let corpus = Corpus::new();
        let config = PipelineConfig::builder()
            .input_dir(corpus.input.join("absent"))
            .output_dir(&corpus.output)
            .build()
            .unwrap();

        let result = mock_pipeline(config).run();
        assert!(matches!(result, Err(PipelineError::Discovery(_))));
        assert!(!corpus.output.exists());
    }

    #[test]
    fn test_date_boundary() {
        let corpus = Corpus::new();
        corpus.add("2025-10-01-0000_band-13.png", b"\xff\x00\x00");
        corpus.add("2025-09-30-2359_band-13.png", b"\xff\x00\x00");
        corpus.add("no-date-here.png", b"\xff\x00\x00");

        let report = mock_pipeline(corpus.config()).run().unwrap();

        assert_eq!(report.discovered, 3);
        assert_eq!(report.excluded, 1);
        assert_eq!(report.newly_processed, 2);
        assert_eq!(report.failed(), 0);
        assert_eq!(
            corpus.outputs(),
            vec!["2025-09-30-2359_band-13.npy", "no-date-here.npy"]
        );
    }

    #[test]
    fn test_disabled_cutoff_processes_everything() {
        let corpus = Corpus::new();
        corpus.add("2030-01-01-0000_band-13.png", b"\xff\x00\x00");

        let config = PipelineConfig {
            holdout_cutoff: None,
            ..corpus.config()
        };
        let report = mock_pipeline(config).run().unwrap();

        assert_eq!(report.excluded, 0);
        assert_eq!(report.newly_processed, 1);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let corpus = Corpus::new();
        corpus.add("2025-08-01-0000_band-13.png", b"\xff\x00\x00");
        corpus.add("2025-08-01-0010_band-13.png", b"\x00\x00\xff");

        let pipeline = mock_pipeline(corpus.config());
        let first = pipeline.run().unwrap();
        let first_bytes: Vec<Vec<u8>> = corpus
            .outputs()
            .iter()
            .map(|name| fs::read(corpus.output.join(name)).unwrap())
            .collect();

        let second = pipeline.run().unwrap();
        let second_bytes: Vec<Vec<u8>> = corpus
            .outputs()
            .iter()
            .map(|name| fs::read(corpus.output.join(name)).unwrap())
            .collect();

        assert_eq!(first.newly_processed, 2);
        assert_eq!(second.newly_processed, 0);
        assert_eq!(second.already_done, 2);
        assert_eq!(second.processed(), 2);
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn test_existing_output_is_not_recomputed() {
        let corpus = Corpus::new();
        let input = corpus.add("scene.png", b"\xff\x00\x00");
        fs::create_dir_all(&corpus.output).unwrap();
        fs::write(corpus.output.join("scene.npy"), b"stale").unwrap();

        let pipeline = mock_pipeline(corpus.config());
        let outcome = pipeline.process_file(&input);

        assert!(matches!(outcome, FileOutcome::AlreadyDone(_)));
        assert_eq!(fs::read(corpus.output.join("scene.npy")).unwrap(), b"stale");
    }

    #[test]
    fn test_corrupt_file_does_not_stop_the_run() {
        let corpus = Corpus::new();
        corpus.add("2025-08-01-0000_band-13.png", b"\xff\x00\x00");
        corpus.add("2025-08-01-0010_band-13.png", b"corrupt");
        corpus.add("2025-08-01-0020_band-13.png", b"\x00\xff\x00");

        let report = mock_pipeline(corpus.config()).run().unwrap();

        assert_eq!(report.newly_processed, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.failures[0].path.file_name().unwrap(),
            "2025-08-01-0010_band-13.png"
        );
        assert!(matches!(report.failures[0].error, PipelineError::ImageDecode(_)));
        assert_eq!(
            corpus.outputs(),
            vec!["2025-08-01-0000_band-13.npy", "2025-08-01-0020_band-13.npy"]
        );

        let first = read_raster(corpus.output.join("2025-08-01-0000_band-13.npy")).unwrap();
        let third = read_raster(corpus.output.join("2025-08-01-0020_band-13.npy")).unwrap();
        assert!(first.data.iter().all(|&t| t == f16::from_f32(-20.0)));
        assert!(third.data.iter().all(|&t| t == f16::from_f32(5.0)));
    }

    #[test]
    fn test_writer_failure_leaves_no_files() {
        let corpus = Corpus::new();
        corpus.add("scene.png", b"\xff\x00\x00");

        let written = Arc::new(Mutex::new(Vec::new()));
        let writer = MockWriter {
            should_fail: true,
            written: written.clone(),
        };
        let pipeline =
            CorpusPipeline::with_custom(index(), MockNormalizer, writer, corpus.config());

        let report = pipeline.run().unwrap();

        assert_eq!(report.failed(), 1);
        assert!(matches!(report.failures[0].error, PipelineError::Persistence(_)));
        assert!(written.lock().unwrap().is_empty());
        assert!(corpus.outputs().is_empty());
    }

    #[test]
    fn test_custom_writer_receives_rasters() {
        let corpus = Corpus::new();
        corpus.add("scene.png", b"\x00\x00\xff");

        let written = Arc::new(Mutex::new(Vec::new()));
        let writer = MockWriter {
            should_fail: false,
            written: written.clone(),
        };
        let pipeline =
            CorpusPipeline::with_custom(index(), MockNormalizer, writer, corpus.config());

        let report = pipeline.run().unwrap();
        let written = written.lock().unwrap();

        assert_eq!(report.newly_processed, 1);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].shape(), (4, 8));
        assert!(written[0].data.iter().all(|&t| t == f16::from_f32(30.0)));
    }

    #[test]
    fn test_parallel_run_matches_sequential() {
        let corpus = Corpus::new();
        for i in 0..12u8 {
            let color = [i * 20, 0, 0];
            let contents: &[u8] = if i == 5 { b"corrupt" } else { &color };
            corpus.add(&format!("2025-08-01-00{:02}_band-13.png", i), contents);
        }

        let config = PipelineConfig {
            workers: 4,
            progress_interval: 3,
            ..corpus.config()
        };
        let report = mock_pipeline(config).run().unwrap();

        assert_eq!(report.discovered, 12);
        assert_eq!(report.newly_processed, 11);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.failures[0].path.file_name().unwrap(),
            "2025-08-01-0005_band-13.png"
        );
        assert_eq!(corpus.outputs().len(), 11);
    }

    fn write_calibration(path: &Path) {
        let mut npz = NpzWriter::new(fs::File::create(path).unwrap());
        npz.add_array("rgb", &arr2(&[[0u8, 0, 0], [255, 0, 0], [0, 0, 255]]))
            .unwrap();
        npz.add_array("temp", &arr1(&[-70.0f64, -10.0, 25.0])).unwrap();
        npz.finish().unwrap();
    }

    #[test]
    fn test_end_to_end_with_png_corpus() {
        let corpus = Corpus::new();
        let lut = corpus.input.parent().unwrap().join("lut.npz");
        write_calibration(&lut);

        corpus.add(
            "2025-08-01-0000_band-13.png",
            &encode_png(RgbImage::from_pixel(300, 200, Rgb([255, 0, 0]))),
        );
        corpus.add(
            "2025-08-01-0010_band-13.png",
            &encode_png(RgbImage::from_pixel(50, 40, Rgb([0, 0, 250]))),
        );

        let config = PipelineConfig::builder()
            .input_dir(&corpus.input)
            .output_dir(&corpus.output)
            .calibration_path(&lut)
            .build()
            .unwrap();
        let pipeline = CorpusPipeline::new(config).unwrap();
        let report = pipeline.run().unwrap();

        assert_eq!(report.newly_processed, 2);

        let red = read_raster(corpus.output.join("2025-08-01-0000_band-13.npy")).unwrap();
        assert_eq!(red.shape(), (128, 128));
        assert!(red.data.iter().all(|&t| t == f16::from_f32(-10.0)));

        let blue = read_raster(corpus.output.join("2025-08-01-0010_band-13.npy")).unwrap();
        assert_eq!(blue.shape(), (128, 128));
        assert!(blue.data.iter().all(|&t| t == f16::from_f32(25.0)));
    }

    #[test]
    fn test_truncated_png_fails_alone_in_real_corpus() {
        let corpus = Corpus::new();
        let lut = corpus.input.parent().unwrap().join("lut.npz");
        write_calibration(&lut);

        let mut truncated = encode_png(RgbImage::from_pixel(64, 64, Rgb([255, 0, 0])));
        truncated.truncate(truncated.len() / 2);

        corpus.add(
            "2025-08-01-0000_band-13.png",
            &encode_png(RgbImage::from_pixel(32, 32, Rgb([255, 0, 0]))),
        );
        corpus.add("2025-08-01-0010_band-13.png", &truncated);
        corpus.add(
            "2025-08-01-0020_band-13.png",
            &encode_png(RgbImage::from_pixel(32, 32, Rgb([0, 0, 255]))),
        );

        let config = PipelineConfig::builder()
            .input_dir(&corpus.input)
            .output_dir(&corpus.output)
            .calibration_path(&lut)
            .target(16, 16)
            .build()
            .unwrap();
        let report = CorpusPipeline::new(config).unwrap().run().unwrap();

        assert_eq!(report.newly_processed, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.failures[0].path.file_name().unwrap(),
            "2025-08-01-0010_band-13.png"
        );
        assert!(matches!(report.failures[0].error, PipelineError::ImageDecode(_)));
        assert_eq!(
            corpus.outputs(),
            vec!["2025-08-01-0000_band-13.npy", "2025-08-01-0020_band-13.npy"]
        );

        let first = read_raster(corpus.output.join("2025-08-01-0000_band-13.npy")).unwrap();
        let third = read_raster(corpus.output.join("2025-08-01-0020_band-13.npy")).unwrap();
        assert!(first.data.iter().all(|&t| t == f16::from_f32(-10.0)));
        assert!(third.data.iter().all(|&t| t == f16::from_f32(25.0)));
    }

    #[test]
    fn test_missing_calibration_aborts_before_side_effects() {
        let corpus = Corpus::new();
        corpus.add("scene.png", b"\xff\x00\x00");

        let config = PipelineConfig::builder()
            .input_dir(&corpus.input)
            .output_dir(&corpus.output)
            .calibration_path(corpus.input.join("missing.npz"))
            .build()
            .unwrap();

        let result = CorpusPipeline::new(config);
        assert!(matches!(result, Err(PipelineError::CalibrationLoad(_))));
        assert!(!corpus.output.exists());
    }
}
