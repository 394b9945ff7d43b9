//! Recognition domain: two-tier glyph recognition.
//!
//! Tiers, in strict priority order:
//!   - cloud.rs: remote service, given the raw raster
//!   - local.rs: tesseract, given the preprocessed raster
//!
//! Each tier is a plain `Result`-returning function; the orchestrator
//! picks the next step with a `match`. No retries: one attempt per tier
//! per `recognize()` call.

pub mod cloud;
pub mod heuristics;
pub mod local;

pub use cloud::{CloudClient, CloudWord, RemoteRecognizer};
pub use local::{LocalEngine, SharedEngine, TesseractConfig, TesseractEngine};

use crate::config::RecognizerConfig;
use crate::ink::raster_has_content;
use crate::preprocess;
use crate::results::{glyphs_from_text, Aggregator, ResultSet, Source};
use crate::RecognitionError;
use image::RgbaImage;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Where the orchestrator is in its current (or last) request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecognitionState {
    Idle,
    SubmittingCloud,
    SubmittingLocal,
    Completed,
    Failed,
}

/// Drives cloud → local recognition for one capture surface.
///
/// Concurrent `recognize()` calls are rejected with `Busy` rather than
/// queued. The local engine handle is shared and may outlive this value.
pub struct Orchestrator<R: RemoteRecognizer, L: LocalEngine> {
    remote: R,
    local: Arc<SharedEngine<L>>,
    aggregator: Aggregator,
    blank_tolerance: u8,
    degrade_delay: Duration,
    state: Mutex<RecognitionState>,
    in_flight: tokio::sync::Mutex<()>,
}

impl<R: RemoteRecognizer, L: LocalEngine> Orchestrator<R, L> {
    pub fn new(remote: R, local: Arc<SharedEngine<L>>, config: &RecognizerConfig) -> Self {
        Self {
            remote,
            local,
            aggregator: Aggregator::from_config(config),
            blank_tolerance: config.blank_tolerance,
            degrade_delay: config.degrade_delay(),
            state: Mutex::new(RecognitionState::Idle),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> RecognitionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn local_engine(&self) -> &Arc<SharedEngine<L>> {
        &self.local
    }

    /// Recognize the glyph drawn on `raster`.
    ///
    /// Errors: `EmptyInput` (nothing drawn, no tier called), `Busy`,
    /// `LocalEngineFailure`, `NoGlyphsDetected`, `Degraded`. Cloud-tier
    /// failures never escape; they hand over to the local tier.
    pub async fn recognize(&self, raster: &RgbaImage) -> Result<ResultSet, RecognitionError> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            log::warn!("[RECOGNIZE] Rejected: another recognition is in flight");
            RecognitionError::Busy
        })?;

        let start = std::time::Instant::now();
        let outcome = self.run(raster).await;
        match &outcome {
            Ok(set) => {
                self.set_state(RecognitionState::Completed);
                log::info!(
                    "[RECOGNIZE] {} candidates via {:?} in {}ms",
                    set.len(),
                    set.source(),
                    start.elapsed().as_millis()
                );
            }
            Err(e) => {
                self.set_state(RecognitionState::Failed);
                log::info!(
                    "[RECOGNIZE] Failed after {}ms: {}",
                    start.elapsed().as_millis(),
                    e
                );
            }
        }
        outcome
    }

    async fn run(&self, raster: &RgbaImage) -> Result<ResultSet, RecognitionError> {
        if !raster_has_content(raster, self.blank_tolerance) {
            return Err(RecognitionError::EmptyInput);
        }

        match self.try_cloud(raster).await {
            Ok(set) => return Ok(set),
            Err(RecognitionError::Degraded(reason)) => return self.degrade(reason).await,
            Err(e) => log::warn!("[CLOUD] Falling back to local engine: {}", e),
        }

        match self.try_local(raster).await {
            Err(RecognitionError::Degraded(reason)) => self.degrade(reason).await,
            other => other,
        }
    }

    /// Cloud tier: raw raster in, confidence-ranked candidates out.
    /// Zero ideographs counts as a tier failure.
    async fn try_cloud(&self, raster: &RgbaImage) -> Result<ResultSet, RecognitionError> {
        self.set_state(RecognitionState::SubmittingCloud);
        let png_bytes = preprocess::encode_png(raster)?;
        let words = self.remote.recognize(png_bytes).await?;
        log::info!(
            "[CLOUD] {} words: {:?}",
            words.len(),
            cloud::ranked_text(&words)
        );

        let glyphs = cloud::rank_words(words);
        if glyphs.is_empty() {
            return Err(RecognitionError::NoGlyphsDetected);
        }
        Ok(self.aggregator.consolidate(&glyphs, Source::Cloud))
    }

    /// Local tier: preprocessed raster in, first-appearance candidates out.
    async fn try_local(&self, raster: &RgbaImage) -> Result<ResultSet, RecognitionError> {
        self.set_state(RecognitionState::SubmittingLocal);
        let processed = preprocess::preprocess(raster);
        let png_bytes = preprocess::encode_png(&processed)?;
        let text = self.local.recognize(&png_bytes).await?;
        log::info!("[LOCAL] Raw text: {:?}", text);

        let glyphs = glyphs_from_text(&text);
        if glyphs.is_empty() {
            return Err(RecognitionError::NoGlyphsDetected);
        }
        Ok(self.aggregator.consolidate(&glyphs, Source::Local))
    }

    async fn degrade(&self, reason: String) -> Result<ResultSet, RecognitionError> {
        log::error!("[RECOGNIZE] Unexpected failure, degrading to manual entry: {}", reason);
        tokio::time::sleep(self.degrade_delay).await;
        Err(RecognitionError::Degraded(reason))
    }

    fn set_state(&self, next: RecognitionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }
}
