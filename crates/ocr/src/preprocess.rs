use image::{imageops::FilterType, DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use crate::config::{ColorStrategy, NormalizeConfig};

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Load a screenshot file, normalize it, and return PNG bytes ready for OCR.
pub fn prepare_for_ocr(path: &Path, cfg: &NormalizeConfig) -> Result<Vec<u8>, PreprocessError> {
    let img = image::open(path)?;
    encode_as_png(normalize(img, cfg))
}

/// Same for raw image bytes (JPEG / PNG / WEBP / …).
pub fn prepare_for_ocr_from_bytes(
    data: &[u8],
    cfg: &NormalizeConfig,
) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img, cfg))
}

/// Upscale → optional top crop → one color strategy. Every step is total
/// over the pixel domain; this function cannot fail.
pub fn normalize(img: DynamicImage, cfg: &NormalizeConfig) -> DynamicImage {
    let img = upscale(img, cfg.scale);
    let img = match cfg.crop_top {
        Some(fraction) => crop_top(img, fraction),
        None => img,
    };
    match cfg.strategy {
        ColorStrategy::BlueChannelBlend { low, high } => blue_channel_blend(&img, low, high),
        ColorStrategy::BrightnessIsolation { threshold } => brightness_isolation(&img, threshold),
        ColorStrategy::ContrastStretch { contrast } => contrast_stretch(&img, contrast),
    }
}

/// Multiply both dimensions by an integer factor. The recognizer segments
/// glyphs more reliably once stroke width clears a few pixels.
pub fn upscale(img: DynamicImage, factor: u32) -> DynamicImage {
    if factor <= 1 {
        return img;
    }
    let (w, h) = (img.width(), img.height());
    img.resize_exact(w * factor, h * factor, FilterType::Triangle)
}

/// Keep only the top `fraction` of the frame. The interesting text sits in
/// the upper part of the detail screen; the bottom is UI chrome.
pub fn crop_top(img: DynamicImage, fraction: f32) -> DynamicImage {
    let fraction = fraction.clamp(0.05, 1.0);
    let height = ((img.height() as f32) * fraction).round().max(1.0) as u32;
    img.crop_imm(0, 0, img.width(), height.min(img.height()))
}

/// Blue-weighted grayscale, inverted, with a two-sided snap. Source text is
/// light-on-dark; the recognizer wants dark glyphs on a light field.
fn blue_channel_blend(img: &DynamicImage, low: u8, high: u8) -> DynamicImage {
    let rgb = img.to_rgb8();
    let out: GrayImage = ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let p = rgb.get_pixel(x, y);
        let (r, g, b) = (f32::from(p[0]), f32::from(p[1]), f32::from(p[2]));
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        let v = 255.0 - (0.6 * b + 0.4 * luma);
        let v = if v < f32::from(low) {
            0.0
        } else if v > f32::from(high) {
            255.0
        } else {
            v
        };
        Luma([v.clamp(0.0, 255.0) as u8])
    });
    DynamicImage::ImageLuma8(out)
}

/// A pixel is text only when every channel clears the threshold — near-white,
/// not merely bright. Text goes pure black, everything else pure white.
fn brightness_isolation(img: &DynamicImage, threshold: u8) -> DynamicImage {
    let rgb = img.to_rgb8();
    let out: GrayImage = ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let p = rgb.get_pixel(x, y);
        let is_text = p[0] > threshold && p[1] > threshold && p[2] > threshold;
        Luma([if is_text { 0u8 } else { 255u8 }])
    });
    DynamicImage::ImageLuma8(out)
}

/// Linear contrast stretch around mid-gray: `gray·c + 128·(1−c)`, clamped.
fn contrast_stretch(img: &DynamicImage, contrast: f32) -> DynamicImage {
    let gray = img.to_luma8();
    let out: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = f32::from(gray.get_pixel(x, y)[0]);
        let v = p * contrast + 128.0 * (1.0 - contrast);
        Luma([v.clamp(0.0, 255.0) as u8])
    });
    DynamicImage::ImageLuma8(out)
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
