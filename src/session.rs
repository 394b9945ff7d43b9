//! Capture session, the surface the UI talks to.
//!
//! Owns one ink surface, its orchestrator and the current result set.
//! Outcomes are pushed to an `EventSink`:
//! - "candidates" when a tier (or manual entry) produced a result set
//! - "manual-entry-requested" when recognition gave up
//!
//! Closing or clearing the session while a recognition is outstanding is
//! safe: the late result is dropped instead of being applied. A closed
//! session does not start new recognitions at all.

use crate::dictionary::{self, Dictionary, LookupFields, LookupOutcome};
use crate::ink::{InkSurface, Point};
use crate::recognize::{LocalEngine, Orchestrator, RecognitionState, RemoteRecognizer};
use crate::results::ResultSet;
use crate::RecognitionError;
use image::RgbaImage;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Signals for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEvent {
    Candidates { results: ResultSet },
    ManualEntryRequested { reason: String },
}

/// Receiver of session events (a web view bridge, a channel, a log).
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<SessionEvent> {
    fn emit(&self, event: SessionEvent) {
        if self.send(event).is_err() {
            log::debug!("[SESSION] Event receiver dropped");
        }
    }
}

/// One open capture surface plus its recognition state.
pub struct CaptureSession<R: RemoteRecognizer, L: LocalEngine> {
    surface: Mutex<InkSurface>,
    orchestrator: Orchestrator<R, L>,
    results: Mutex<Option<ResultSet>>,
    manual_entry_available: AtomicBool,
    open: AtomicBool,
    sink: Arc<dyn EventSink>,
    dictionary: Option<Arc<dyn Dictionary>>,
    lookup_fields: LookupFields,
}

impl<R: RemoteRecognizer, L: LocalEngine> CaptureSession<R, L> {
    pub fn new(surface: InkSurface, orchestrator: Orchestrator<R, L>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            surface: Mutex::new(surface),
            orchestrator,
            results: Mutex::new(None),
            manual_entry_available: AtomicBool::new(false),
            open: AtomicBool::new(true),
            sink,
            dictionary: None,
            lookup_fields: LookupFields::default(),
        }
    }

    pub fn with_dictionary(mut self, dictionary: Arc<dyn Dictionary>, fields: LookupFields) -> Self {
        self.dictionary = Some(dictionary);
        self.lookup_fields = fields;
        self
    }

    fn surface(&self) -> MutexGuard<'_, InkSurface> {
        self.surface.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn results_slot(&self) -> MutexGuard<'_, Option<ResultSet>> {
        self.results.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Stroke input ────────────────────────────────────────────────

    pub fn begin_stroke(&self, point: Point) {
        if self.is_open() {
            self.surface().begin_stroke(point);
        }
    }

    pub fn extend_stroke(&self, point: Point) {
        if self.is_open() {
            self.surface().extend_stroke(point);
        }
    }

    pub fn end_stroke(&self) {
        if self.is_open() {
            self.surface().end_stroke();
        }
    }

    /// Wipe the ink and forget the previous candidates.
    pub fn clear(&self) {
        self.surface().clear();
        *self.results_slot() = None;
        self.manual_entry_available.store(false, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> RgbaImage {
        self.surface().snapshot()
    }

    pub fn display_image(&self) -> RgbaImage {
        self.surface().display_image()
    }

    pub fn has_content(&self) -> bool {
        self.surface().has_content()
    }

    // ── Recognition ─────────────────────────────────────────────────

    /// Recognize the current ink and publish the outcome.
    ///
    /// Returns `Ok(None)` when the session is closed, or was closed or
    /// cleared before the result arrived; nothing is applied or emitted
    /// in that case.
    pub async fn recognize(&self) -> Result<Option<ResultSet>, RecognitionError> {
        if !self.is_open() {
            return Ok(None);
        }
        let (raster, generation) = {
            let surface = self.surface();
            (surface.snapshot(), surface.generation())
        };
        let outcome = self.orchestrator.recognize(&raster).await;

        if !self.is_open() {
            log::info!("[SESSION] Closed during recognition, discarding result");
            return Ok(None);
        }
        if self.surface().generation() != generation {
            log::info!("[SESSION] Cleared during recognition, discarding result");
            return Ok(None);
        }

        match outcome {
            Ok(set) => {
                self.apply(set.clone());
                Ok(Some(set))
            }
            Err(e) if e.requires_manual_entry() => {
                self.manual_entry_available.store(true, Ordering::SeqCst);
                self.sink.emit(SessionEvent::ManualEntryRequested {
                    reason: e.to_string(),
                });
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Accept a typed character. Invalid input leaves the current
    /// results untouched.
    pub fn manual_entry(&self, input: &str) -> Result<ResultSet, RecognitionError> {
        let set = self.orchestrator.aggregator().manual_entry(input)?;
        self.apply(set.clone());
        Ok(set)
    }

    fn apply(&self, set: ResultSet) {
        *self.results_slot() = Some(set.clone());
        self.manual_entry_available.store(false, Ordering::SeqCst);
        self.sink.emit(SessionEvent::Candidates { results: set });
    }

    /// Describe the candidate at `index` through the dictionary.
    ///
    /// `None` if there is no such candidate or no dictionary attached.
    pub fn select(&self, index: usize) -> Option<LookupOutcome> {
        let ch = self.results_slot().as_ref()?.get(index)?.ch;
        let dictionary = self.dictionary.as_ref()?;
        Some(dictionary::describe(
            dictionary.as_ref(),
            &ch.to_string(),
            &self.lookup_fields,
        ))
    }

    // ── State ───────────────────────────────────────────────────────

    pub fn results(&self) -> Option<ResultSet> {
        self.results_slot().clone()
    }

    pub fn manual_entry_available(&self) -> bool {
        self.manual_entry_available.load(Ordering::SeqCst)
    }

    pub fn recognition_state(&self) -> RecognitionState {
        self.orchestrator.state()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Mark the surface gone. Stroke input is ignored from here on.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        log::info!("[SESSION] Closed");
    }
}
