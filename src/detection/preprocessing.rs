use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::morphology::{grayscale_erode, Mask};

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Width of the horizontal structuring element for an image `image_width` wide.
/// Rounds half to even and never goes below one pixel.
pub fn erosion_width(image_width: u32, fraction: f64) -> usize {
    let width = (image_width as f64 * fraction).round_ties_even();
    (width as usize).max(1)
}

/// Longest reach on one side of a single `Mask`, whose anchor is a `u8`
/// and whose size is capped at 511 pixels.
const MAX_MASK_REACH: usize = 255;

fn line_mask(left: usize, right: usize) -> Mask {
    let row = GrayImage::from_pixel((left + right + 1) as u32, 1, Luma([255]));
    Mask::from_image(&row, left as u8, 0)
}

/// Grayscale erosion with a `kernel_width x 1` rectangle anchored at its middle.
///
/// Dark strokes spread sideways so that the glyphs of a word run together.
/// Pixels outside the image do not take part in the minimum. Kernels wider
/// than one `Mask` allows are applied as a chain of shorter segments, which
/// covers the same window.
pub fn erode_horizontal(img: &GrayImage, kernel_width: usize) -> GrayImage {
    let kernel_width = kernel_width.max(1);
    let mut left = kernel_width / 2;
    let mut right = kernel_width - 1 - left;

    let mut eroded = img.clone();
    if img.width() == 0 || img.height() == 0 {
        return eroded;
    }

    while left > 0 || right > 0 {
        let (l, r) = (left.min(MAX_MASK_REACH), right.min(MAX_MASK_REACH));
        eroded = grayscale_erode(&eroded, &line_mask(l, r));
        left -= l;
        right -= r;
    }

    eroded
}

/// Otsu binarization followed by inversion: dark text becomes 255.
pub fn binarize_inverted(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    let mut mask = threshold(img, level, ThresholdType::Binary);
    image::imageops::invert(&mut mask);
    mask
}

/// Full preprocessing chain: grayscale, erosion, binarization.
pub fn text_mask(gray: &GrayImage, erode_width_fraction: f64) -> GrayImage {
    let kernel_width = erosion_width(gray.width(), erode_width_fraction);
    let eroded = erode_horizontal(gray, kernel_width);
    binarize_inverted(&eroded)
}
