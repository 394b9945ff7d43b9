//! Stroke rasterization onto an RGBA canvas.
//!
//! Strokes are drawn as capsules (round caps and joins) with a one-pixel
//! anti-aliased rim. Ink is black; coverage darkens the existing pixel,
//! so overlapping segments never lighten each other.

use super::{Point, Stroke};
use image::{Rgba, RgbaImage};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GUIDE_GRAY: u8 = 0xDD;

/// A fully opaque white canvas.
pub fn blank(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, WHITE)
}

/// Draw every segment of `stroke` onto `canvas`.
///
/// A single-point stroke renders as a dot of diameter `line_width`.
pub fn draw_stroke(canvas: &mut RgbaImage, stroke: &Stroke, line_width: f32) {
    let radius = (line_width / 2.0).max(0.5);
    match stroke.points() {
        [] => {}
        [only] => draw_segment(canvas, *only, *only, radius),
        points => {
            for pair in points.windows(2) {
                draw_segment(canvas, pair[0], pair[1], radius);
            }
        }
    }
}

fn draw_segment(canvas: &mut RgbaImage, a: Point, b: Point, radius: f32) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let pad = radius + 1.0;
    let min_x = (a.x.min(b.x) - pad).floor().max(0.0) as u32;
    let min_y = (a.y.min(b.y) - pad).floor().max(0.0) as u32;
    let max_x = (a.x.max(b.x) + pad).ceil().min((width - 1) as f32);
    let max_y = (a.y.max(b.y) + pad).ceil().min((height - 1) as f32);
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }
    let (max_x, max_y) = (max_x as u32, max_y as u32);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            let distance = distance_to_segment(center, a, b);
            let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
            if coverage > 0.0 {
                darken(canvas, x, y, coverage);
            }
        }
    }
}

fn darken(canvas: &mut RgbaImage, x: u32, y: u32, coverage: f32) {
    let pixel = canvas.get_pixel_mut(x, y);
    let ink = (255.0 * (1.0 - coverage)).round() as u8;
    for channel in 0..3 {
        pixel.0[channel] = pixel.0[channel].min(ink);
    }
    pixel.0[3] = 255;
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Draw the writing guides: a 3×3 grid plus the center cross-hair.
///
/// Guides are light gray and only ever appear in the display image.
pub fn draw_guides(canvas: &mut RgbaImage) {
    let (width, height) = canvas.dimensions();
    let gray = Rgba([GUIDE_GRAY, GUIDE_GRAY, GUIDE_GRAY, 255]);

    let mut columns = vec![width / 3, width * 2 / 3, width / 2];
    let mut rows = vec![height / 3, height * 2 / 3, height / 2];
    columns.dedup();
    rows.dedup();

    for x in columns.into_iter().filter(|x| *x < width) {
        for y in 0..height {
            canvas.put_pixel(x, y, gray);
        }
    }
    for y in rows.into_iter().filter(|y| *y < height) {
        for x in 0..width {
            canvas.put_pixel(x, y, gray);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(points: &[(f32, f32)]) -> Stroke {
        Stroke::from_points(points.iter().map(|(x, y)| Point::new(*x, *y)).collect())
    }

    #[test]
    fn segment_paints_core_black() {
        let mut canvas = blank(40, 20);
        draw_stroke(&mut canvas, &stroke(&[(5.0, 10.0), (35.0, 10.0)]), 4.0);
        assert_eq!(canvas.get_pixel(20, 10).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(20, 2).0, WHITE.0);
    }

    #[test]
    fn round_cap_extends_past_endpoint() {
        let mut canvas = blank(40, 20);
        draw_stroke(&mut canvas, &stroke(&[(10.0, 10.0), (20.0, 10.0)]), 6.0);
        // Within the cap radius beyond the last point.
        assert!(canvas.get_pixel(21, 10).0[0] < 128);
        assert_eq!(canvas.get_pixel(30, 10).0, WHITE.0);
    }

    #[test]
    fn single_point_draws_dot() {
        let mut canvas = blank(20, 20);
        draw_stroke(&mut canvas, &stroke(&[(10.0, 10.0)]), 6.0);
        assert_eq!(canvas.get_pixel(10, 10).0, [0, 0, 0, 255]);
    }

    #[test]
    fn off_canvas_segment_is_clipped() {
        let mut canvas = blank(10, 10);
        draw_stroke(&mut canvas, &stroke(&[(-50.0, -50.0), (-40.0, -40.0)]), 4.0);
        assert!(canvas.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn guides_draw_grid_and_crosshair() {
        let mut canvas = blank(90, 60);
        draw_guides(&mut canvas);
        assert_eq!(canvas.get_pixel(30, 5).0[0], GUIDE_GRAY);
        assert_eq!(canvas.get_pixel(45, 5).0[0], GUIDE_GRAY);
        assert_eq!(canvas.get_pixel(5, 30).0[0], GUIDE_GRAY);
        assert_eq!(canvas.get_pixel(1, 1).0, WHITE.0);
    }
}
