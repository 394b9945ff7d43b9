//! Otsu's automatic threshold selection.

use image::GrayImage;

/// Pick the threshold that maximizes between-class variance.
///
/// Class "low" is every level `<= t`, class "high" every level `> t`.
/// The score for `t` is `w_low · w_high · (mean_low − mean_high)²`,
/// computed from cumulative sums over a 256-bin histogram. Ties go to
/// the smallest `t`. A uniform image scores zero everywhere and yields 0.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return 0;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut weight_low = 0u64;
    let mut sum_low = 0f64;
    let mut best_threshold = 0u8;
    let mut best_variance = 0f64;

    for (t, &count) in histogram.iter().enumerate() {
        weight_low += count;
        sum_low += t as f64 * count as f64;

        let weight_high = total - weight_low;
        if weight_low == 0 || weight_high == 0 {
            continue;
        }

        let mean_low = sum_low / weight_low as f64;
        let mean_high = (sum_total - sum_low) / weight_high as f64;
        let w_low = weight_low as f64 / total as f64;
        let w_high = weight_high as f64 / total as f64;
        let variance = w_low * w_high * (mean_low - mean_high).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}
