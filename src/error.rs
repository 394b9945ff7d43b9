//! Recognition error taxonomy.
//!
//! One enum covers every failure the pipeline can report. Cloud-tier
//! failures never leave the orchestrator; they are logged and promote the
//! request to the local tier. Everything else reaches the caller, which
//! uses `requires_manual_entry()` to decide whether to show the
//! manual-entry form.

/// Errors produced by the capture → recognition pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecognitionError {
    /// Surface has no ink. Neither tier was invoked.
    #[error("nothing drawn on the surface")]
    EmptyInput,

    /// Network, HTTP status or response-shape failure on the cloud tier.
    #[error("remote recognition failed: {0}")]
    RemoteTransportFailure(String),

    /// Local engine could not be initialized or failed to recognize.
    #[error("local recognition engine failed: {0}")]
    LocalEngineFailure(String),

    /// A tier answered but the text held no CJK ideographs.
    #[error("no Chinese characters detected")]
    NoGlyphsDetected,

    /// Manual override was not exactly one CJK ideograph.
    #[error("not a single Chinese character: {0:?}")]
    InvalidManualCharacter(String),

    /// Another recognition is already in flight on this orchestrator.
    #[error("a recognition is already in progress")]
    Busy,

    /// Unexpected failure (image encode, decode); the pipeline gave up
    /// after the degrade delay.
    #[error("recognition degraded to manual entry: {0}")]
    Degraded(String),
}

impl RecognitionError {
    /// True when the UI should offer the manual-entry form for this error.
    pub fn requires_manual_entry(&self) -> bool {
        matches!(
            self,
            RecognitionError::LocalEngineFailure(_)
                | RecognitionError::NoGlyphsDetected
                | RecognitionError::Degraded(_)
        )
    }
}

impl From<RecognitionError> for String {
    fn from(error: RecognitionError) -> Self {
        error.to_string()
    }
}
