//! Ink capture domain, public API.
//!
//! This module owns stroke geometry and its rasterization. It holds no
//! recognition logic: the orchestrator only ever sees `snapshot()`.

mod raster;

pub use raster::blank;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A finished stroke: every point traced between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stroke {
    points: Vec<Point>,
}

impl Stroke {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Drawing state for one capture canvas.
///
/// At most one stroke is in progress at a time. Committed strokes are
/// immutable until `clear()`.
#[derive(Debug, Clone)]
pub struct InkSurface {
    width: u32,
    height: u32,
    line_width: f32,
    blank_tolerance: u8,
    strokes: Vec<Stroke>,
    active: Option<Vec<Point>>,
    show_guides: bool,
    /// Bumped by `clear()`; lets callers tell whether a snapshot is stale.
    generation: u64,
}

impl InkSurface {
    pub fn new(width: u32, height: u32, line_width: f32) -> Self {
        Self {
            width,
            height,
            line_width,
            blank_tolerance: 8,
            strokes: Vec::new(),
            active: None,
            show_guides: true,
            generation: 0,
        }
    }

    pub fn from_config(config: &crate::config::RecognizerConfig) -> Self {
        Self::new(config.canvas_width, config.canvas_height, config.line_width)
            .with_blank_tolerance(config.blank_tolerance)
    }

    pub fn with_blank_tolerance(mut self, tolerance: u8) -> Self {
        self.blank_tolerance = tolerance;
        self
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Number of `clear()` calls so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new stroke. An unfinished stroke is committed first.
    pub fn begin_stroke(&mut self, point: Point) {
        if self.active.is_some() {
            self.end_stroke();
        }
        self.active = Some(vec![point]);
    }

    /// Append to the active stroke. No-op when nothing is being drawn.
    pub fn extend_stroke(&mut self, point: Point) {
        if let Some(points) = self.active.as_mut() {
            points.push(point);
        }
    }

    /// Commit the active stroke. No-op when nothing is being drawn.
    pub fn end_stroke(&mut self) {
        if let Some(points) = self.active.take() {
            log::debug!("[INK] Stroke committed: {} points", points.len());
            self.strokes.push(Stroke::from_points(points));
        }
    }

    /// Discard all ink and restore the blank canvas with its guides.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.active = None;
        self.show_guides = true;
        self.generation += 1;
        log::debug!("[INK] Surface cleared (generation {})", self.generation);
    }

    /// Hide or show the guide overlay in `display_image()`.
    pub fn set_guides_visible(&mut self, visible: bool) {
        self.show_guides = visible;
    }

    /// Render committed strokes over white. This is the recognition input:
    /// guides are never part of it.
    pub fn snapshot(&self) -> RgbaImage {
        let mut canvas = raster::blank(self.width, self.height);
        for stroke in &self.strokes {
            raster::draw_stroke(&mut canvas, stroke, self.line_width);
        }
        canvas
    }

    /// Render what the user sees: guides underneath, then committed and
    /// in-progress ink.
    pub fn display_image(&self) -> RgbaImage {
        let mut canvas = raster::blank(self.width, self.height);
        if self.show_guides {
            raster::draw_guides(&mut canvas);
        }
        for stroke in &self.strokes {
            raster::draw_stroke(&mut canvas, stroke, self.line_width);
        }
        if let Some(points) = &self.active {
            raster::draw_stroke(&mut canvas, &Stroke::from_points(points.clone()), self.line_width);
        }
        canvas
    }

    /// Base64-encoded PNG of `snapshot()`, for handing to a web view.
    pub fn snapshot_png_base64(&self) -> Result<String, crate::RecognitionError> {
        let png = crate::preprocess::encode_png(&self.snapshot())?;
        Ok(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            &png,
        ))
    }

    /// True if any snapshot pixel is darker than white by more than the
    /// blank tolerance.
    pub fn has_content(&self) -> bool {
        if self.strokes.is_empty() {
            return false;
        }
        raster_has_content(&self.snapshot(), self.blank_tolerance)
    }
}

/// True if any pixel's luminance falls more than `tolerance` below white.
pub fn raster_has_content(raster: &RgbaImage, tolerance: u8) -> bool {
    let floor = 255u8.saturating_sub(tolerance);
    raster
        .pixels()
        .any(|p| crate::preprocess::luma(p.0[0], p.0[1], p.0[2]) < floor)
}
