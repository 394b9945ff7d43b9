//! Local recognition tier: Tesseract over stdio.
//!
//! The engine is expensive to bring up (binary lookup, traineddata check),
//! so it lives in a `SharedEngine`: created on first use, reused for the
//! rest of the process, one recognition at a time.

use crate::RecognitionError;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OnceCell};

/// Upper bound for a single tesseract run (seconds).
const RECOGNIZE_TIMEOUT_SECS: u64 = 30;

/// An OCR engine usable as the fallback tier.
#[allow(async_fn_in_trait)]
pub trait LocalEngine: Sized + Send + Sync {
    type Config: Send + Sync;

    /// One-time setup. Called at most once per successful `SharedEngine`.
    async fn initialize(config: &Self::Config) -> Result<Self, RecognitionError>;

    /// Recognize a preprocessed PNG; returns free-form text.
    async fn recognize(&mut self, png_bytes: &[u8]) -> Result<String, RecognitionError>;
}

/// Lazily-initialized, process-lifetime engine handle.
///
/// Initialization failures are not cached: the next call tries again.
pub struct SharedEngine<L: LocalEngine> {
    config: L::Config,
    engine: OnceCell<Mutex<L>>,
}

impl<L: LocalEngine> SharedEngine<L> {
    pub fn new(config: L::Config) -> Self {
        Self {
            config,
            engine: OnceCell::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.initialized()
    }

    /// Run one recognition, initializing the engine first if needed.
    pub async fn recognize(&self, png_bytes: &[u8]) -> Result<String, RecognitionError> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                let start = std::time::Instant::now();
                let engine = L::initialize(&self.config).await?;
                log::info!(
                    "[LOCAL] Engine initialized in {}ms",
                    start.elapsed().as_millis()
                );
                Ok::<_, RecognitionError>(Mutex::new(engine))
            })
            .await?;

        let mut guard = engine.lock().await;
        guard.recognize(png_bytes).await
    }
}

/// Settings for the tesseract CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct TesseractConfig {
    /// Explicit binary; `None` resolves `tesseract` from PATH.
    pub binary: Option<PathBuf>,
    /// `+`-joined traineddata names, e.g. `chi_sim+chi_tra`.
    pub languages: String,
    /// Page segmentation mode. 6 = single uniform block of text.
    pub page_segmentation_mode: u8,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: None,
            languages: "chi_sim+chi_tra".to_string(),
            page_segmentation_mode: 6,
        }
    }
}

impl TesseractConfig {
    pub fn from_config(config: &crate::config::RecognizerConfig) -> Self {
        Self {
            binary: config.tesseract_path.clone(),
            languages: config.languages.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }
}

/// A located, language-checked tesseract installation.
#[derive(Debug)]
pub struct TesseractEngine {
    binary: PathBuf,
    languages: String,
    page_segmentation_mode: u8,
}

impl LocalEngine for TesseractEngine {
    type Config = TesseractConfig;

    async fn initialize(config: &TesseractConfig) -> Result<Self, RecognitionError> {
        let binary = match &config.binary {
            Some(path) => path.clone(),
            None => which::which("tesseract").map_err(|e| {
                RecognitionError::LocalEngineFailure(format!("tesseract not found: {}", e))
            })?,
        };

        let output = tokio::process::Command::new(&binary)
            .arg("--list-langs")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                RecognitionError::LocalEngineFailure(format!(
                    "failed to run {}: {}",
                    binary.display(),
                    e
                ))
            })?;

        // Older releases print the list on stderr.
        let mut listing = String::from_utf8_lossy(&output.stdout).to_string();
        listing.push_str(&String::from_utf8_lossy(&output.stderr));
        let missing = missing_languages(&config.languages, &listing);
        if !missing.is_empty() {
            return Err(RecognitionError::LocalEngineFailure(format!(
                "missing traineddata: {}",
                missing.join(", ")
            )));
        }

        log::info!(
            "[LOCAL] Using {} with {} (psm {})",
            binary.display(),
            config.languages,
            config.page_segmentation_mode
        );
        Ok(Self {
            binary,
            languages: config.languages.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        })
    }

    async fn recognize(&mut self, png_bytes: &[u8]) -> Result<String, RecognitionError> {
        let start = std::time::Instant::now();
        let mut child = tokio::process::Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.languages.as_str(), "--psm"])
            .arg(self.page_segmentation_mode.to_string())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RecognitionError::LocalEngineFailure(format!("spawn failed: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RecognitionError::LocalEngineFailure("no stdin".to_string()))?;
        stdin
            .write_all(png_bytes)
            .await
            .map_err(|e| RecognitionError::LocalEngineFailure(format!("stdin write failed: {}", e)))?;
        drop(stdin);

        let output = tokio::time::timeout(
            Duration::from_secs(RECOGNIZE_TIMEOUT_SECS),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            RecognitionError::LocalEngineFailure(format!(
                "tesseract timed out after {}s",
                RECOGNIZE_TIMEOUT_SECS
            ))
        })?
        .map_err(|e| RecognitionError::LocalEngineFailure(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::LocalEngineFailure(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        log::info!(
            "[LOCAL] Recognized {} chars in {}ms",
            text.chars().count(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Languages from a `+`-joined spec that do not appear in `--list-langs` output.
fn missing_languages(languages: &str, listing: &str) -> Vec<String> {
    let installed: Vec<&str> = listing.lines().map(str::trim).collect();
    languages
        .split('+')
        .map(str::trim)
        .filter(|lang| !lang.is_empty() && !installed.contains(lang))
        .map(str::to_string)
        .collect()
}
