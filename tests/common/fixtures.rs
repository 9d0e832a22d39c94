use addrscan::detection::ner::{EntityTagger, LexiconTagger};
use addrscan::detection::ocr::{LayoutHint, TextRecognizer};
use addrscan::{Collaborators, RegionError};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const PAGE_WIDTH: u32 = 400;
pub const PAGE_HEIGHT: u32 = 200;

/// Three 140px-wide text lines stacked 20px apart, like a small address block.
pub const ADDRESS_ROWS: [(u32, u32, u32, u32); 3] = [
    (100, 10, 140, 15),
    (100, 30, 140, 15),
    (100, 50, 140, 15),
];

pub const ADDRESS_TEXT: &str = "John Doe\n12 Main St\nSpringfield 12345\n";

pub const LEXICON: &str = "john\tPERSON\ndoe\tPERSON\nspringfield\tLOCATION\n";

/// White page with a solid black rectangle per `(x, y, width, height)`.
pub fn page_image(rows: &[(u32, u32, u32, u32)]) -> DynamicImage {
    let mut img = RgbImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Rgb([255, 255, 255]));
    for &(x, y, w, h) in rows {
        for py in y..y + h {
            for px in x..x + w {
                img.put_pixel(px, py, Rgb([0, 0, 0]));
            }
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Same as [`page_image`], saved as a temporary PNG.
/// The file will be automatically cleaned up when dropped.
pub fn write_page(rows: &[(u32, u32, u32, u32)]) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    page_image(rows)
        .save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

pub fn lexicon_tagger() -> LexiconTagger {
    LexiconTagger::parse(LEXICON).expect("Test lexicon should parse")
}

/// Recognizer that hands out scripted replies in call order and records the
/// size of every region it was given.
pub struct ScriptedRecognizer {
    replies: Mutex<Vec<String>>,
    regions: Mutex<Vec<(u32, u32)>>,
    gate: Option<Mutex<mpsc::Receiver<()>>>,
}

impl ScriptedRecognizer {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            regions: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Block every call until the returned sender sends or is dropped.
    pub fn gated(replies: &[&str]) -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let mut recognizer = Self::new(replies);
        recognizer.gate = Some(Mutex::new(rx));
        (recognizer, tx)
    }

    pub fn regions(&self) -> Vec<(u32, u32)> {
        self.regions.lock().unwrap().clone()
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, region: &GrayImage, _hint: LayoutHint) -> Result<String, RegionError> {
        if let Some(gate) = &self.gate {
            let _ = gate.lock().unwrap().recv();
        }
        self.regions.lock().unwrap().push(region.dimensions());

        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(RegionError::Recognition("no scripted reply left".into()));
        }
        Ok(replies.remove(0))
    }
}

pub fn collaborators(recognizer: Arc<ScriptedRecognizer>) -> Collaborators {
    let tagger: Arc<dyn EntityTagger> = Arc::new(lexicon_tagger());
    Collaborators::new(recognizer, tagger)
}
