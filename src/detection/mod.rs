pub mod preprocessing;
pub mod contours;
pub mod merging;
pub mod grouping;
pub mod ocr;
pub mod ner;
pub mod validation;
pub mod render;
pub mod steps;

use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span};
use uuid::Uuid;
use crate::config::DetectionConfig;
use crate::error::RunError;
use crate::models::PipelineResult;
use crate::pipeline::Pipeline;
use crate::session::Collaborators;

/// Decode a JPEG/PNG from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage, RunError> {
    let decode_error = |message: String| RunError::Decode {
        path: path.to_path_buf(),
        message,
    };

    ImageReader::open(path)
        .map_err(|e| decode_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))
}

/// Steps from the source image up to the block hypotheses, no recognition.
pub fn build_geometry_pipeline(config: &DetectionConfig) -> Pipeline {
    use crate::detection::steps::*;

    Pipeline::new()
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(ErosionStep {
            width_fraction: config.preprocess.erode_width_fraction,
        }))
        .add_step(Arc::new(BinarizeStep))
        .add_step(Arc::new(BlobExtractionStep))
        .add_step(Arc::new(SizeFilterStep {
            envelope: config.size,
        }))
        .add_step(Arc::new(RowMergeStep {
            params: config.merge,
        }))
        .add_step(Arc::new(BlockGroupingStep {
            params: config.group,
            envelope: config.size,
        }))
}

/// Full detection pipeline including recognition and validation.
pub fn build_standard_pipeline(config: &DetectionConfig, collaborators: &Collaborators) -> Pipeline {
    use crate::detection::steps::AddressValidationStep;

    build_geometry_pipeline(config).add_step(Arc::new(AddressValidationStep::new(
        collaborators.recognizer.clone(),
        collaborators.tagger.clone(),
        config.validation,
    )))
}

/// Runs the whole address detection on one image at a time.
pub struct AddressDetector {
    config: DetectionConfig,
    collaborators: Collaborators,
    debug_dir: Option<PathBuf>,
}

impl AddressDetector {
    pub fn new(config: DetectionConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            debug_dir: None,
        }
    }

    /// Save per-step snapshots under `dir`, which must be empty or absent.
    /// Each run writes into its own subdirectory named after the run id.
    pub fn with_debug_dir(mut self, dir: PathBuf) -> anyhow::Result<Self> {
        Pipeline::new().with_debug(dir.clone())?;
        self.debug_dir = Some(dir);
        Ok(self)
    }

    fn pipeline(&self, run_id: Uuid) -> anyhow::Result<Pipeline> {
        let pipeline = build_standard_pipeline(&self.config, &self.collaborators);
        match &self.debug_dir {
            Some(dir) => pipeline.with_debug(dir.join(run_id.to_string())),
            None => Ok(pipeline),
        }
    }

    /// Run the pipeline on a decoded image.
    pub fn detect(&self, img: DynamicImage) -> anyhow::Result<PipelineResult> {
        let run_id = Uuid::new_v4();
        let _span = info_span!("run", %run_id).entered();
        info!(width = img.width(), height = img.height(), "detecting address blocks");

        let data = self.pipeline(run_id)?.run(img)?;
        let evaluated = data.outcomes.len();
        let result = data.into_result();

        info!(
            evaluated,
            accepted = result.candidates.len(),
            "address detection finished"
        );
        Ok(result)
    }

    /// Decode `path` and run the pipeline on it.
    pub fn detect_path(&self, path: &Path) -> Result<PipelineResult, RunError> {
        let img = load_image(path)?;
        debug!("decoded {}", path.display());
        Ok(self.detect(img)?)
    }
}
