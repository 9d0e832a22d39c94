use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::Path;
use crate::error::RegionError;

/// How the recognizer should treat the submitted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutHint {
    /// The region is one uniform block of text lines
    SingleBlock,
}

/// Turns a cropped grayscale region into text, one recognized line per `\n`.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, region: &GrayImage, hint: LayoutHint) -> Result<String, RegionError>;
}

/// `ocrs` engine backed by the detection and recognition `.rten` models.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load `text-detection.rten` and `text-recognition.rten` from `model_dir`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let detection_model_path = model_dir.join("text-detection.rten");
        let recognition_model_path = model_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }
}

impl TextRecognizer for OcrsRecognizer {
    // ocrs always runs its own layout analysis and already emits one line of
    // text per detected line, which is what SingleBlock asks for.
    fn recognize(&self, region: &GrayImage, _hint: LayoutHint) -> Result<String, RegionError> {
        let rgb = DynamicImage::ImageLuma8(region.clone()).to_rgb8();

        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| RegionError::Encode(e.to_string()))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| RegionError::Encode(e.to_string()))?;

        self.engine
            .get_text(&input)
            .map_err(|e| RegionError::Recognition(e.to_string()))
    }
}
