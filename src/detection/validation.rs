use image::GrayImage;
use tracing::{debug, warn};
use crate::config::ValidationParams;
use crate::detection::ner::{EntityLabel, EntityTagger};
use crate::detection::ocr::{LayoutHint, TextRecognizer};
use crate::error::RegionError;
use crate::models::{AddressCandidate, BlockOutcome, Group, Rectangle, RejectReason, Verdict};

/// Number of lines an address block is assumed to have: name, street, city.
pub const ADDRESS_LINES: usize = 3;

/// Split recognized text into its non-empty lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split(['\n', '\r']).filter(|line| !line.is_empty()).collect()
}

fn has_digit(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_digit())
}

fn has_letter(line: &str) -> bool {
    line.chars().any(char::is_alphabetic)
}

/// Shape test for a name line followed by two address lines.
///
/// The name must not contain digits; both address lines need at least one
/// digit and one letter.
pub fn heuristic_address_check<S: AsRef<str>>(lines: &[S]) -> Result<(), RejectReason> {
    let [name, street, city, ..] = lines else {
        return Err(RejectReason::TooFewLines);
    };

    if has_digit(name.as_ref()) {
        return Err(RejectReason::DigitInName);
    }
    let street = street.as_ref();
    if !has_digit(street) || !has_letter(street) {
        return Err(RejectReason::MalformedStreetLine);
    }
    let city = city.as_ref();
    if !has_digit(city) || !has_letter(city) {
        return Err(RejectReason::MalformedCityLine);
    }

    Ok(())
}

/// Crops block hypotheses, reads them and decides whether they are addresses.
pub struct AddressValidator<'a> {
    recognizer: &'a dyn TextRecognizer,
    tagger: &'a dyn EntityTagger,
    params: ValidationParams,
}

impl<'a> AddressValidator<'a> {
    pub fn new(
        recognizer: &'a dyn TextRecognizer,
        tagger: &'a dyn EntityTagger,
        params: ValidationParams,
    ) -> Self {
        Self {
            recognizer,
            tagger,
            params,
        }
    }

    /// Padded, clamped region that would be cropped for `group`, or `None`
    /// when the group is outside the size window.
    pub fn region_for(&self, group: &Group, gray: &GrayImage) -> Option<Rectangle> {
        if !self.params.accepts_group_size(group.len()) {
            return None;
        }
        let bounds = group.bounds()?;
        let padding = self.params.padding;
        let region = bounds
            .inflate(padding, padding)
            .clamp_to(gray.width(), gray.height());
        (!region.is_empty()).then_some(region)
    }

    /// Evaluate one group. `Ok(None)` means the group was never sent for
    /// recognition; an error means this region failed and should be dropped.
    pub fn evaluate(
        &self,
        group: &Group,
        gray: &GrayImage,
    ) -> Result<Option<BlockOutcome>, RegionError> {
        let Some(region) = self.region_for(group, gray) else {
            return Ok(None);
        };

        let crop = image::imageops::crop_imm(
            gray,
            region.x as u32,
            region.y as u32,
            region.width as u32,
            region.height as u32,
        )
        .to_image();

        let text = self.recognizer.recognize(&crop, LayoutHint::SingleBlock)?;
        let lines = split_lines(&text);
        debug!(%region, lines = lines.len(), "recognized block");

        let verdict = match self.judge(&lines)? {
            Ok(()) => Verdict::Accepted(AddressCandidate {
                region,
                lines: lines
                    .iter()
                    .take(ADDRESS_LINES)
                    .map(|line| line.to_string())
                    .collect(),
            }),
            Err(reason) => Verdict::Rejected(reason),
        };

        Ok(Some(BlockOutcome { region, verdict }))
    }

    fn judge(&self, lines: &[&str]) -> Result<Result<(), RejectReason>, RegionError> {
        if let Err(reason) = heuristic_address_check(lines) {
            return Ok(Err(reason));
        }

        let spans = self
            .tagger
            .classify(lines[0])
            .map_err(|e| RegionError::Tagging(format!("{:#}", e)))?;
        let has = |label: EntityLabel| spans.iter().any(|span| span.label == label);

        if !has(EntityLabel::Person) {
            return Ok(Err(RejectReason::NoPerson));
        }
        if self.params.require_location && !has(EntityLabel::Location) {
            return Ok(Err(RejectReason::NoLocation));
        }
        Ok(Ok(()))
    }

    /// Evaluate every group in order, dropping regions whose recognition failed.
    pub fn evaluate_all(&self, groups: &[Group], gray: &GrayImage) -> Vec<BlockOutcome> {
        let mut outcomes = Vec::new();

        for group in groups {
            match self.evaluate(group, gray) {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(e) => warn!(members = group.len(), "dropping region: {}", e),
            }
        }

        outcomes
    }
}
