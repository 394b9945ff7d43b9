//! Image preprocessing for the local recognition engine.
//!
//! raster → grayscale → Otsu threshold → binarize → 3×3 median.
//! The cloud tier never goes through here; it gets the raw raster.
//!
//! Every step allocates a new buffer. Inputs are never mutated.

mod otsu;

pub use otsu::otsu_threshold;

use crate::RecognitionError;
use image::{GrayImage, Luma, Rgba, RgbaImage};

/// Integer luma, `0.299R + 0.587G + 0.114B` rounded to nearest.
///
/// Pure white maps to exactly 255.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}

/// Per-pixel luminance. Alpha is ignored: surfaces are always opaque.
pub fn grayscale(raster: &RgbaImage) -> GrayImage {
    let (width, height) = raster.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let p = raster.get_pixel(x, y).0;
        Luma([luma(p[0], p[1], p[2])])
    })
}

/// Threshold to 0/255: luminance above `threshold` is background (255),
/// at or below is ink (0).
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = gray.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if gray.get_pixel(x, y).0[0] > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// One pass of a 3×3 median filter. The outermost ring of pixels is
/// copied unchanged.
pub fn median_filter(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }
    let mut window = [0u8; 9];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut i = 0;
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    window[i] = image.get_pixel(nx, ny).0[0];
                    i += 1;
                }
            }
            window.sort_unstable();
            out.put_pixel(x, y, Luma([window[4]]));
        }
    }
    out
}

/// Full preprocessing chain. Output has the raster's dimensions with
/// R = G = B = filtered value and opaque alpha.
///
/// If more than half of the binarized pixels come out dark the image is
/// taken to be light-on-dark and is inverted, so ink always comes out dark.
/// Ink touching the canvas edge does not trigger this; only the global
/// balance does.
pub fn preprocess(raster: &RgbaImage) -> RgbaImage {
    let start = std::time::Instant::now();
    let gray = grayscale(raster);
    let threshold = otsu_threshold(&gray);
    let mut binary = binarize(&gray, threshold);

    if dark_majority(&binary) {
        log::warn!(
            "[PREPROCESS] Mostly dark at threshold {}, inverting polarity",
            threshold
        );
        image::imageops::invert(&mut binary);
    }

    let filtered = median_filter(&binary);
    log::info!(
        "[PREPROCESS] {}x{} threshold={} in {}ms",
        raster.width(),
        raster.height(),
        threshold,
        start.elapsed().as_millis()
    );

    let (width, height) = filtered.dimensions();
    RgbaImage::from_fn(width, height, |x, y| {
        let v = filtered.get_pixel(x, y).0[0];
        Rgba([v, v, v, 255])
    })
}

/// Strict majority of ink (0) pixels in a binarized image. Ties keep
/// the image as is.
fn dark_majority(binary: &GrayImage) -> bool {
    let dark = binary.pixels().filter(|p| p.0[0] == 0).count();
    dark * 2 > binary.width() as usize * binary.height() as usize
}

/// Encode a raster as PNG bytes in memory.
pub fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>, RecognitionError> {
    let mut png_bytes = Vec::new();
    raster
        .write_to(
            &mut std::io::Cursor::new(&mut png_bytes),
            image::ImageFormat::Png,
        )
        .map_err(|e| RecognitionError::Degraded(format!("PNG encode failed: {}", e)))?;
    Ok(png_bytes)
}
