use image::GrayImage;
use imageproc::contours::{find_contours, Contour};
use crate::config::SizeEnvelope;
use crate::models::Rectangle;

/// Bounding rectangles of every outer and hole border in a binary mask.
///
/// Non-zero pixels are foreground. Hole borders produce their own boxes, so
/// the same region can appear more than once.
pub fn find_blob_boxes(mask: &GrayImage) -> Vec<Rectangle> {
    let contours: Vec<Contour<u32>> = find_contours(mask);

    contours
        .iter()
        .filter_map(bounding_rect)
        .collect()
}

fn bounding_rect(contour: &Contour<u32>) -> Option<Rectangle> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(Rectangle::new(
        min_x as i32,
        min_y as i32,
        (max_x - min_x + 1) as i32,
        (max_y - min_y + 1) as i32,
    ))
}

impl SizeEnvelope {
    pub fn is_too_large(&self, r: &Rectangle, width: u32, height: u32) -> bool {
        r.width as f64 > width as f64 * self.max_width
            || r.height as f64 > height as f64 * self.max_height
    }

    pub fn is_too_small(&self, r: &Rectangle, width: u32, height: u32) -> bool {
        (r.width as f64) < width as f64 * self.min_width
            || (r.height as f64) < height as f64 * self.min_height
    }

    pub fn admits(&self, r: &Rectangle, width: u32, height: u32) -> bool {
        !self.is_too_large(r, width, height) && !self.is_too_small(r, width, height)
    }
}

/// Keep only boxes inside the glyph/word size envelope of a `width x height` image.
pub fn filter_by_size(
    boxes: &[Rectangle],
    envelope: &SizeEnvelope,
    width: u32,
    height: u32,
) -> Vec<Rectangle> {
    boxes
        .iter()
        .filter(|r| envelope.admits(r, width, height))
        .copied()
        .collect()
}
