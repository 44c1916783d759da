use image::{imageops::FilterType, DynamicImage};
use serde::{Deserialize, Serialize};

/// Minimum red channel value for a pixel to count toward stress.
const STRESS_BRIGHTNESS_FLOOR: u8 = 90;

/// Cheap colour signals sampled independently of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelSignals {
    pub plant_pixels: u32,
    pub stress_score: u32,
    pub sampled_pixels: u32,
}

impl PixelSignals {
    /// Share of sampled pixels that look like foliage, in percent.
    pub fn plant_density(&self) -> f64 {
        if self.sampled_pixels == 0 {
            return 0.0;
        }
        self.plant_pixels as f64 / self.sampled_pixels as f64 * 100.0
    }
}

pub fn is_plant_pixel(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    g > b && g > r * 0.7
}

pub fn is_stress_pixel(r: u8, g: u8, _b: u8) -> bool {
    (r as f32) > (g as f32) * 0.85 && r > STRESS_BRIGHTNESS_FLOOR
}

/// Downsample to `grid`×`grid` and classify every sample on its own.
pub fn analyze(img: &DynamicImage, grid: u32) -> PixelSignals {
    let small = image::imageops::resize(&img.to_rgb8(), grid, grid, FilterType::Triangle);

    let mut signals = PixelSignals {
        plant_pixels: 0,
        stress_score: 0,
        sampled_pixels: grid * grid,
    };
    for pixel in small.pixels() {
        let [r, g, b] = pixel.0;
        if is_plant_pixel(r, g, b) {
            signals.plant_pixels += 1;
        }
        if is_stress_pixel(r, g, b) {
            signals.stress_score += 1;
        }
    }
    signals
}
