//! hanzi-ink: handwritten Chinese character recognition.
//!
//! Draw a glyph, get ranked candidate characters. The pipeline is:
//!
//!   ink surface → (raw PNG) → cloud tier
//!               → preprocess → (binarized PNG) → local tesseract tier
//!               → result aggregation → candidates | manual entry
//!
//! Modules:
//!   - ink/: stroke capture and rasterization
//!   - preprocess/: grayscale, Otsu binarization, median denoise
//!   - recognize/: cloud + local tiers and the orchestrator
//!   - results/: dedup, ranking, manual entry
//!   - session.rs: capture session and UI events
//!   - dictionary.rs: selection lookups (external capability)
//!   - config.rs: config file, env vars, credentials

pub mod config;
pub mod dictionary;
mod error;
pub mod ink;
pub mod preprocess;
pub mod recognize;
pub mod results;
pub mod session;

pub use config::RecognizerConfig;
pub use dictionary::{Dictionary, HanziInfo, LookupFields, LookupOutcome};
pub use error::RecognitionError;
pub use ink::{InkSurface, Point, Stroke};
pub use recognize::{
    CloudClient, LocalEngine, Orchestrator, RecognitionState, RemoteRecognizer, SharedEngine,
    TesseractConfig, TesseractEngine,
};
pub use results::{Aggregator, Candidate, ResultSet, Source};
pub use session::{CaptureSession, EventSink, SessionEvent};

use std::sync::Arc;

/// Load `.env.local` / `.env` and start the logger. Safe to call twice.
pub fn init() {
    config::load_env_files();
    let _ = env_logger::try_init();
}

/// The process-wide tesseract handle. Create once and share between sessions.
pub fn tesseract_engine(config: &RecognizerConfig) -> Arc<SharedEngine<TesseractEngine>> {
    Arc::new(SharedEngine::new(TesseractConfig::from_config(config)))
}

/// A capture session wired to the real cloud client and a shared
/// tesseract engine.
pub fn open_session(
    config: &RecognizerConfig,
    engine: Arc<SharedEngine<TesseractEngine>>,
    sink: Arc<dyn EventSink>,
) -> Result<CaptureSession<CloudClient, TesseractEngine>, RecognitionError> {
    let remote = CloudClient::from_config(config)?;
    let orchestrator = Orchestrator::new(remote, engine, config);
    log::info!(
        "[SESSION] Opened {}x{} surface",
        config.canvas_width,
        config.canvas_height
    );
    Ok(CaptureSession::new(
        InkSurface::from_config(config),
        orchestrator,
        sink,
    ))
}
