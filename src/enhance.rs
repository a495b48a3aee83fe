use image::{imageops::FilterType, GrayImage};
use imageproc::{contrast::equalize_histogram, filter::gaussian_blur_f32, filter::median_filter};
use serde::{Deserialize, Serialize};

/// Pixel-level preparation applied to every rotated crop before recognition.
pub trait Enhancer: Send + Sync {
    fn enhance(&self, image: &GrayImage) -> GrayImage;
}

/// Hands the crop to the recognizer untouched.
pub struct Passthrough;

impl Enhancer for Passthrough {
    fn enhance(&self, image: &GrayImage) -> GrayImage {
        image.clone()
    }
}

/// Knobs of the default enhancement chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Crops whose shorter side is below this are upscaled.
    pub upscale_min_side: u32,
    pub upscale_factor: u32,
    /// Median filter radius (0 disables denoising).
    pub denoise_radius: u32,
    pub unsharp_amount: f32,
    pub unsharp_sigma: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            upscale_min_side: 180,
            upscale_factor: 4,
            denoise_radius: 1,
            unsharp_amount: 1.05,
            unsharp_sigma: 1.05,
        }
    }
}

/// Default chain for small instrument crops:
///
/// upscale (when small) → median denoise → histogram equalisation →
/// unsharp mask → min-max contrast stretch.
pub struct OcrEnhancer {
    pub config: EnhanceConfig,
}

impl OcrEnhancer {
    pub fn new(config: EnhanceConfig) -> Self {
        Self { config }
    }
}

impl Enhancer for OcrEnhancer {
    fn enhance(&self, image: &GrayImage) -> GrayImage {
        let cfg = &self.config;
        if image.width() == 0 || image.height() == 0 {
            return image.clone();
        }

        let mut g = upscale_if_needed(image, cfg.upscale_min_side, cfg.upscale_factor);
        if cfg.denoise_radius > 0 {
            g = median_filter(&g, cfg.denoise_radius, cfg.denoise_radius);
        }
        g = equalize_histogram(&g);
        if cfg.unsharp_amount > 0.0 && cfg.unsharp_sigma > 0.0 {
            g = unsharp(&g, cfg.unsharp_amount, cfg.unsharp_sigma);
        }
        normalize_contrast(&mut g);
        g
    }
}

fn upscale_if_needed(image: &GrayImage, min_side: u32, factor: u32) -> GrayImage {
    let (w, h) = image.dimensions();
    if w.min(h) >= min_side || factor <= 1 {
        return image.clone();
    }
    image::imageops::resize(image, w * factor, h * factor, FilterType::CatmullRom)
}

/// `(1 + amount) * g - amount * blur(g)`, clamped to 8 bits.
fn unsharp(image: &GrayImage, amount: f32, sigma: f32) -> GrayImage {
    let blur = gaussian_blur_f32(image, sigma);
    let mut out = image.clone();
    for (o, b) in out.pixels_mut().zip(blur.pixels()) {
        let v = (1.0 + amount) * o[0] as f32 - amount * b[0] as f32;
        o[0] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Stretch the occupied intensity range to the full 0–255 span.
fn normalize_contrast(image: &mut GrayImage) {
    let (lo, hi) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if hi <= lo {
        return;
    }
    let span = (hi - lo) as f32;
    for p in image.pixels_mut() {
        p[0] = (((p[0] - lo) as f32) * 255.0 / span).round() as u8;
    }
}
