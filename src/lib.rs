pub mod client;
pub mod config;
pub mod errors;
pub mod traits;

pub mod mocks;

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use walkdir::WalkDir;

pub use client::GeminiClient;
pub use config::Config;
pub use errors::{Result, UpscaleError};
pub use traits::{FrameTransformer, TransformOutcome};

/// One input frame and its output slot, identified by filename.
///
/// The output file keeps the input's filename; its presence is the sole
/// completion marker the batch persists between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub file_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Terminal state of one frame within a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Output already existed; no remote call was made.
    Skipped,
    /// Transformed and persisted.
    Done,
    /// Decode failure, empty response, or remote error. No output written,
    /// so the next run retries the frame naturally.
    Failed { rate_limited: bool },
}

/// Fixed pacing intervals for the driver loop.
///
/// The inter-frame delay is the sole congestion-control mechanism; the
/// backoff is an extra pause taken after a throttled failure before the
/// next frame is attempted. Tests zero both out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub frame_delay: Duration,
    pub rate_limit_backoff: Duration,
}

impl Pacing {
    pub const fn new(frame_delay_secs: u64, rate_limit_backoff_secs: u64) -> Self {
        Self {
            frame_delay: Duration::from_secs(frame_delay_secs),
            rate_limit_backoff: Duration::from_secs(rate_limit_backoff_secs),
        }
    }

    pub const fn none() -> Self {
        Self::new(0, 0)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(2, 20)
    }
}

/// Per-run tally of frame outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rate_limit_pauses: usize,
}

/// Drives a full batch pass over the input directory.
///
/// Strictly sequential: one frame at a time, in sorted filename order, with
/// a pacing pause after every frame. Per-frame failures are contained at the
/// frame boundary; only environment problems (output directory creation,
/// output writes) abort the run.
pub struct FrameProcessor<T: FrameTransformer> {
    transformer: T,
    input_dir: PathBuf,
    output_dir: PathBuf,
    pacing: Pacing,
}

impl<T: FrameTransformer> FrameProcessor<T> {
    pub fn new(transformer: T, config: &Config) -> Self {
        Self {
            transformer,
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    pub fn process_directory(&self) -> Result<BatchSummary> {
        fs::create_dir_all(&self.output_dir).map_err(|e| UpscaleError::FileSystem {
            path: self.output_dir.clone(),
            operation: "output directory creation".to_string(),
            source: e,
        })?;

        let frames = self.collect_frames()?;
        if frames.is_empty() {
            info!("No frames found in {}", self.input_dir.display());
            return Ok(BatchSummary::default());
        }

        let pb = ProgressBar::new(frames.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .map_err(|e| UpscaleError::Configuration {
                    message: format!("invalid progress bar template: {e}"),
                })?
                .progress_chars("#>-"),
        );

        let mut summary = BatchSummary::default();
        for frame in &frames {
            match self.process_frame(frame)? {
                FrameStatus::Skipped => summary.skipped += 1,
                FrameStatus::Done => summary.processed += 1,
                FrameStatus::Failed { rate_limited } => {
                    summary.failed += 1;
                    if rate_limited {
                        warn!(
                            "Rate limit hit. Pausing for {}s...",
                            self.pacing.rate_limit_backoff.as_secs()
                        );
                        summary.rate_limit_pauses += 1;
                        thread::sleep(self.pacing.rate_limit_backoff);
                    }
                }
            }
            pb.inc(1);

            // Safety sleep to prevent rapid-fire rate limits on Pro models.
            thread::sleep(self.pacing.frame_delay);
        }

        pb.finish();
        info!(
            "Batch complete: {} upscaled, {} skipped, {} failed",
            summary.processed, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    /// Enumerate the frames to process, sorted by filename ascending.
    ///
    /// Non-recursive, filtered to the supported raster extensions. The sort
    /// is the only sequencing guarantee the batch offers, so successive runs
    /// always walk frames in the same order.
    pub fn collect_frames(&self) -> Result<Vec<Frame>> {
        if !self.input_dir.exists() {
            return Err(UpscaleError::FileSystem {
                path: self.input_dir.clone(),
                operation: "input directory lookup".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "input directory does not exist",
                ),
            });
        }

        let mut frames = Vec::new();
        for entry in WalkDir::new(&self.input_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_supported_frame_format(path) {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                frames.push(Frame {
                    output_path: self.output_dir.join(&file_name),
                    input_path: path.to_path_buf(),
                    file_name,
                });
            }
        }

        frames.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(frames)
    }

    /// Handle one frame to a terminal state.
    ///
    /// Decode and remote-call failures are converted to `Failed` here and
    /// never escape; the `Err` path is reserved for output-side filesystem
    /// problems, which abort the batch.
    fn process_frame(&self, frame: &Frame) -> Result<FrameStatus> {
        if frame.output_path.exists() {
            info!("Skipping (exists): {}", frame.file_name);
            return Ok(FrameStatus::Skipped);
        }

        info!("Processing: {}...", frame.file_name);

        let img = match image::open(&frame.input_path) {
            Ok(img) => img,
            Err(e) => {
                error!("Failed to decode {}: {e}", frame.file_name);
                return Ok(FrameStatus::Failed {
                    rate_limited: false,
                });
            }
        };

        match self.transformer.transform(&img) {
            Ok(TransformOutcome::Produced(upscaled)) => {
                if let Some(parent) = frame.output_path.parent() {
                    fs::create_dir_all(parent).map_err(|e| UpscaleError::FileSystem {
                        path: parent.to_path_buf(),
                        operation: "output directory creation".to_string(),
                        source: e,
                    })?;
                }
                upscaled
                    .save(&frame.output_path)
                    .map_err(|e| UpscaleError::ImageProcessing {
                        path: frame.output_path.display().to_string(),
                        operation: "image saving".to_string(),
                        source: Box::new(e),
                    })?;
                info!(" -> Saved to {}", frame.output_path.display());
                Ok(FrameStatus::Done)
            }
            Ok(TransformOutcome::Empty) => {
                warn!("No image returned for {}", frame.file_name);
                Ok(FrameStatus::Failed {
                    rate_limited: false,
                })
            }
            Err(e) => {
                error!("Error processing {}: {e}", frame.file_name);
                Ok(FrameStatus::Failed {
                    rate_limited: e.is_rate_limited(),
                })
            }
        }
    }
}

pub fn is_supported_frame_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn test_config(input_dir: PathBuf, output_dir: PathBuf) -> Config {
        Config {
            input_dir,
            output_dir,
            model: config::DEFAULT_MODEL.to_string(),
            temperature: config::DEFAULT_TEMPERATURE,
        }
    }

    #[test]
    fn test_supported_formats() {
        let cases = vec![
            ("frame.jpg", true),
            ("frame.JPG", true),
            ("frame.jpeg", true),
            ("frame.png", true),
            ("frame.PNG", true),
            ("notes.txt", false),
            ("frame.webp", false),
            ("frame", false),
        ];

        for (file_name, expected) in cases {
            assert_eq!(
                is_supported_frame_format(Path::new(file_name)),
                expected,
                "unexpected classification for {file_name}"
            );
        }
    }

    #[test]
    fn test_frames_sorted_by_filename() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input_dir = temp_dir.path().join("input");
        fs::create_dir_all(&input_dir)?;

        for name in ["b.png", "a.jpg", "c.jpg", "notes.txt"] {
            fs::write(input_dir.join(name), b"data")?;
        }

        let config = test_config(input_dir, temp_dir.path().join("output"));
        let processor = FrameProcessor::new(mocks::MockTransformer::new(), &config);

        let frames = processor.collect_frames()?;
        let names: Vec<_> = frames.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.jpg"]);
        Ok(())
    }

    #[test]
    fn test_output_path_keeps_filename() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input_dir = temp_dir.path().join("input");
        let output_dir = temp_dir.path().join("output");
        fs::create_dir_all(&input_dir)?;
        fs::write(input_dir.join("frame_0001.png"), b"data")?;

        let config = test_config(input_dir, output_dir.clone());
        let processor = FrameProcessor::new(mocks::MockTransformer::new(), &config);

        let frames = processor.collect_frames()?;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].output_path, output_dir.join("frame_0001.png"));
        Ok(())
    }

    #[test]
    fn test_subdirectories_are_not_enumerated() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input_dir = temp_dir.path().join("input");
        let nested = input_dir.join("nested");
        fs::create_dir_all(&nested)?;
        fs::write(input_dir.join("top.png"), b"data")?;
        fs::write(nested.join("deep.png"), b"data")?;

        let config = test_config(input_dir, temp_dir.path().join("output"));
        let processor = FrameProcessor::new(mocks::MockTransformer::new(), &config);

        let frames = processor.collect_frames()?;
        let names: Vec<_> = frames.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["top.png"]);
        Ok(())
    }

    #[test]
    fn test_missing_input_dir_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(
            temp_dir.path().join("missing"),
            temp_dir.path().join("output"),
        );
        let processor = FrameProcessor::new(mocks::MockTransformer::new(), &config);
        assert!(processor.collect_frames().is_err());
    }

    #[test]
    fn test_default_pacing() {
        let pacing = Pacing::default();
        assert_eq!(pacing.frame_delay, Duration::from_secs(2));
        assert_eq!(pacing.rate_limit_backoff, Duration::from_secs(20));
        assert_eq!(Pacing::none().frame_delay, Duration::ZERO);
    }
}
