use image::{DynamicImage, GrayImage};
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Result;
use tracing::debug;
use crate::detection::render::render_debug;
use crate::models::{BlockOutcome, Group, PipelineResult, Rectangle};

/// Data that flows through the pipeline.
/// Each step reads what earlier steps produced and fills in its own part.
#[derive(Clone)]
pub struct PipelineData {
    /// The source image, shared with every snapshot and the final overlay
    pub original: Arc<DynamicImage>,

    /// Grayscale copy of the source, used for cropping regions
    pub gray: GrayImage,

    /// Working image of the preprocessing steps (ends up as the text mask)
    pub image: GrayImage,

    /// Raw blob boxes, later size-filtered
    pub boxes: Vec<Rectangle>,

    /// Word/line boxes after the horizontal merge
    pub merged: Vec<Rectangle>,

    /// Block hypotheses
    pub groups: Vec<Group>,

    /// Evaluated blocks, accepted or rejected
    pub outcomes: Vec<BlockOutcome>,
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            original: Arc::new(image),
            gray: GrayImage::new(0, 0),
            image: GrayImage::new(0, 0),
            boxes: Vec::new(),
            merged: Vec::new(),
            groups: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.original.width()
    }

    pub fn height(&self) -> u32 {
        self.original.height()
    }

    /// Accepted blocks followed by a blank line each.
    pub fn extracted_text(&self) -> String {
        let mut text = String::new();
        for candidate in self.outcomes.iter().filter_map(BlockOutcome::candidate) {
            text.push_str(&candidate.text());
            text.push_str("\n\n");
        }
        text
    }

    /// Render the overlay and collect the accepted candidates.
    pub fn into_result(self) -> PipelineResult {
        let debug_image = render_debug(&self.original, &self.merged, &self.outcomes);
        let extracted_text = self.extracted_text();
        let candidates = self
            .outcomes
            .iter()
            .filter_map(BlockOutcome::candidate)
            .cloned()
            .collect();

        PipelineResult {
            debug_image,
            extracted_text,
            candidates,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return the enriched data
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug file names)
    fn name(&self) -> &str;

    /// Image saved for this step in debug mode
    fn debug_view(&self, data: &PipelineData) -> DynamicImage {
        DynamicImage::ImageLuma8(data.image.clone())
    }
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn debug_dir(&self) -> Option<&PathBuf> {
        self.context.debug.as_ref().map(|d| &d.output_dir)
    }

    fn save_snapshot(&self, file_name: &str, image: &DynamicImage) -> Result<()> {
        if let Some(dir) = self.debug_dir() {
            let path = dir.join(file_name);
            image
                .save(&path)
                .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
            debug!("saved debug snapshot {}", path.display());
        }
        Ok(())
    }

    /// Run every step in order on an input image
    pub fn run(&self, input: DynamicImage) -> Result<PipelineData> {
        self.run_partial(input, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: DynamicImage, num_steps: usize) -> Result<PipelineData> {
        if self.debug_dir().is_some() {
            self.save_snapshot("00_input.png", &input)?;
        }

        let mut data = PipelineData::from_image(input);

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            data = step.process(data, &self.context)?;

            debug!(
                step = step.name(),
                boxes = data.boxes.len(),
                merged = data.merged.len(),
                groups = data.groups.len(),
                outcomes = data.outcomes.len(),
                "step finished"
            );

            if self.debug_dir().is_some() {
                let file_name = format!(
                    "{:02}_{}.png",
                    step_idx + 1,
                    step.name().to_lowercase().replace(' ', "_")
                );
                self.save_snapshot(&file_name, &step.debug_view(&data))?;
            }
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressCandidate, RejectReason, Verdict};

    struct Seed(Rectangle);

    impl PipelineStep for Seed {
        fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
            data.boxes.push(self.0);
            Ok(data)
        }

        fn name(&self) -> &str {
            "Seed Box"
        }

        fn debug_view(&self, data: &PipelineData) -> DynamicImage {
            DynamicImage::ImageLuma8(GrayImage::new(data.width(), data.height()))
        }
    }

    fn blank() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::new(20, 10))
    }

    #[test]
    fn steps_run_in_order_and_partial_runs_stop_early() {
        let pipeline = Pipeline::new()
            .add_step(Arc::new(Seed(Rectangle::new(0, 0, 1, 1))))
            .add_step(Arc::new(Seed(Rectangle::new(2, 2, 1, 1))));

        let full = pipeline.run(blank()).unwrap();
        assert_eq!(full.boxes, vec![Rectangle::new(0, 0, 1, 1), Rectangle::new(2, 2, 1, 1)]);

        let partial = pipeline.run_partial(blank(), 1).unwrap();
        assert_eq!(partial.boxes.len(), 1);
    }

    #[test]
    fn debug_mode_writes_one_snapshot_per_step() {
        let dir = tempfile::TempDir::new().unwrap();
        let pipeline = Pipeline::new()
            .add_step(Arc::new(Seed(Rectangle::new(0, 0, 1, 1))))
            .with_debug(dir.path().to_path_buf())
            .unwrap();

        pipeline.run(blank()).unwrap();
        assert!(dir.path().join("00_input.png").exists());
        assert!(dir.path().join("01_seed_box.png").exists());
    }

    #[test]
    fn debug_dir_must_be_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("leftover.txt"), "x").unwrap();
        assert!(Pipeline::new().with_debug(dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn extracted_text_separates_blocks_with_blank_lines() {
        let mut data = PipelineData::from_image(blank());
        let accepted = |name: &str| BlockOutcome {
            region: Rectangle::new(0, 0, 5, 5),
            verdict: Verdict::Accepted(AddressCandidate {
                region: Rectangle::new(0, 0, 5, 5),
                lines: vec![name.to_string(), "1 Main St".into(), "Town 2".into()],
            }),
        };
        data.outcomes = vec![
            accepted("John Doe"),
            BlockOutcome {
                region: Rectangle::new(0, 0, 5, 5),
                verdict: Verdict::Rejected(RejectReason::DigitInName),
            },
            accepted("Jane Roe"),
        ];

        let result = data.into_result();
        assert_eq!(
            result.extracted_text,
            "John Doe\n1 Main St\nTown 2\n\nJane Roe\n1 Main St\nTown 2\n\n"
        );
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.debug_image.dimensions(), (20, 10));
    }
}
