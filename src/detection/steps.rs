use crate::config::{GroupParams, MergeParams, SizeEnvelope, ValidationParams};
use crate::detection::ner::EntityTagger;
use crate::detection::ocr::TextRecognizer;
use crate::detection::validation::AddressValidator;
use crate::detection::{contours, grouping, merging, preprocessing, render};
use crate::models::Rectangle;
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};
use anyhow::Result;
use image::DynamicImage;
use std::sync::Arc;

fn boxes_view(data: &PipelineData, boxes: &[Rectangle]) -> DynamicImage {
    DynamicImage::ImageRgb8(render::render_boxes(&data.original, boxes))
}

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        data.gray = preprocessing::to_grayscale(&data.original);
        data.image = data.gray.clone();
        Ok(data)
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Horizontal erosion so the glyphs of a word run together
pub struct ErosionStep {
    pub width_fraction: f64,
}

impl PipelineStep for ErosionStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let kernel_width = preprocessing::erosion_width(data.image.width(), self.width_fraction);
        data.image = preprocessing::erode_horizontal(&data.image, kernel_width);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Horizontal Erosion"
    }
}

/// Otsu threshold and inversion, text becomes foreground
pub struct BinarizeStep;

impl PipelineStep for BinarizeStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        data.image = preprocessing::binarize_inverted(&data.image);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Binarization"
    }
}

/// Bounding boxes of every contour in the text mask
pub struct BlobExtractionStep;

impl PipelineStep for BlobExtractionStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        data.boxes = contours::find_blob_boxes(&data.image);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Blob Extraction"
    }

    fn debug_view(&self, data: &PipelineData) -> DynamicImage {
        boxes_view(data, &data.boxes)
    }
}

/// Drop boxes outside the plausible glyph/word size
pub struct SizeFilterStep {
    pub envelope: SizeEnvelope,
}

impl PipelineStep for SizeFilterStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let (width, height) = (data.width(), data.height());
        data.boxes = contours::filter_by_size(&data.boxes, &self.envelope, width, height);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Size Filter"
    }

    fn debug_view(&self, data: &PipelineData) -> DynamicImage {
        boxes_view(data, &data.boxes)
    }
}

/// Merge fragments of the same row into word/line boxes
pub struct RowMergeStep {
    pub params: MergeParams,
}

impl PipelineStep for RowMergeStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let (width, height) = (data.width(), data.height());
        data.merged = merging::merge_rows(&data.boxes, &self.params, width, height);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Row Merge"
    }

    fn debug_view(&self, data: &PipelineData) -> DynamicImage {
        boxes_view(data, &data.merged)
    }
}

/// Stack merged lines into block hypotheses
pub struct BlockGroupingStep {
    pub params: GroupParams,
    pub envelope: SizeEnvelope,
}

impl PipelineStep for BlockGroupingStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let (width, height) = (data.width(), data.height());
        data.groups =
            grouping::group_blocks(&data.merged, &self.params, &self.envelope, width, height);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Block Grouping"
    }

    fn debug_view(&self, data: &PipelineData) -> DynamicImage {
        let bounds: Vec<Rectangle> = data.groups.iter().filter_map(|g| g.bounds()).collect();
        boxes_view(data, &bounds)
    }
}

/// Read each plausible block and keep those shaped like an address
pub struct AddressValidationStep {
    recognizer: Arc<dyn TextRecognizer>,
    tagger: Arc<dyn EntityTagger>,
    pub params: ValidationParams,
}

impl AddressValidationStep {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        tagger: Arc<dyn EntityTagger>,
        params: ValidationParams,
    ) -> Self {
        Self {
            recognizer,
            tagger,
            params,
        }
    }
}

impl PipelineStep for AddressValidationStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let validator =
            AddressValidator::new(self.recognizer.as_ref(), self.tagger.as_ref(), self.params);
        data.outcomes = validator.evaluate_all(&data.groups, &data.gray);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Address Validation"
    }

    fn debug_view(&self, data: &PipelineData) -> DynamicImage {
        DynamicImage::ImageRgb8(render::render_debug(
            &data.original,
            &data.merged,
            &data.outcomes,
        ))
    }
}
