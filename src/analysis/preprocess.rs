use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

pub fn decode(payload: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(payload).context("unsupported or corrupt image payload")
}

/// Fixed classifier input: bilinear resize to `size`×`size`, channels scaled
/// into `[0, 1]`, laid out NCHW with a batch of one.
pub fn standardize(img: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, size, size, FilterType::Triangle);

    let side = size as usize;
    let mut input = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    input
}
