//! Fixed, deterministic preprocessing applied before segmentation and recognition.

use image::GrayImage;

use super::layout::InkMask;

/// Argument to `imageops::contrast`. It squares `(100 + c) / 100`, so 22.5
/// stretches intensities around mid-gray by about 1.5x.
pub const CONTRAST_PERCENT: f32 = 22.5;

/// Pages whose darkest and lightest pixels are closer than this carry no ink.
const MIN_INK_CONTRAST: u8 = 48;

/// Contrast boost followed by 3x3 sharpening.
pub fn enhance(raster: &GrayImage) -> GrayImage {
    let boosted = image::imageops::contrast(raster, CONTRAST_PERCENT);
    imageproc::filter::sharpen3x3(&boosted)
}

/// Otsu-binarized ink mask of an enhanced page.
pub fn ink_mask(enhanced: &GrayImage) -> InkMask {
    let (width, height) = enhanced.dimensions();
    let (lo, hi) = enhanced
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if hi.saturating_sub(lo) < MIN_INK_CONTRAST {
        return InkMask::blank(width, height);
    }

    let level = imageproc::contrast::otsu_level(enhanced);
    let bits = enhanced.pixels().map(|p| p[0] <= level).collect();
    InkMask::new(width, height, bits)
}
