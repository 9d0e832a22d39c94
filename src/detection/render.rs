use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use crate::models::{BlockOutcome, Rectangle};

const MERGED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const ACCEPTED_COLOR: Rgb<u8> = Rgb([128, 0, 128]);
const REJECTED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const MERGED_THICKNESS: i32 = 2;
const ACCEPTED_THICKNESS: i32 = 6;
const REJECTED_THICKNESS: i32 = 2;

/// Draw a `thickness` pixel outline centred on the border of `r`.
fn draw_outline(img: &mut RgbImage, r: &Rectangle, color: Rgb<u8>, thickness: i32) {
    let outset = thickness / 2;
    for step in 0..thickness {
        let offset = outset - step;
        let width = r.width + 2 * offset;
        let height = r.height + 2 * offset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(r.x - offset, r.y - offset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(img, rect, color);
    }
}

/// Overlay merged boxes and evaluated blocks on a copy of the source image.
///
/// Merged boxes are red, accepted blocks thick purple, rejected blocks lime.
/// Groups that were never evaluated are not drawn.
pub fn render_debug(
    original: &DynamicImage,
    merged: &[Rectangle],
    outcomes: &[BlockOutcome],
) -> RgbImage {
    let mut canvas = original.to_rgb8();

    for r in merged {
        draw_outline(&mut canvas, r, MERGED_COLOR, MERGED_THICKNESS);
    }

    for outcome in outcomes {
        if outcome.is_accepted() {
            draw_outline(&mut canvas, &outcome.region, ACCEPTED_COLOR, ACCEPTED_THICKNESS);
        } else {
            draw_outline(&mut canvas, &outcome.region, REJECTED_COLOR, REJECTED_THICKNESS);
        }
    }

    canvas
}

/// Overlay a plain list of boxes, used for intermediate debug snapshots.
pub fn render_boxes(original: &DynamicImage, boxes: &[Rectangle]) -> RgbImage {
    render_debug(original, boxes, &[])
}
