//! Recognizer configuration and credential resolution.
//!
//! Layering, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `~/.config/hanzi-ink/config.json` (missing or invalid file is ignored)
//! 3. `HANZI_INK_*` environment variables
//!
//! The cloud token is resolved separately: env var first, OS keychain second.

use crate::dictionary::LookupFields;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";
const KEYRING_SERVICE: &str = "hanzi-ink";
const KEYRING_USER: &str = "cloud";

/// Tunables for the capture, preprocessing and recognition stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecognizerConfig {
    /// Remote recognition endpoint. `None` disables the cloud tier.
    pub cloud_endpoint: Option<String>,
    pub cloud_timeout_ms: u64,
    /// Explicit tesseract binary; resolved from PATH when unset.
    pub tesseract_path: Option<PathBuf>,
    pub languages: String,
    pub page_segmentation_mode: u8,
    /// Maximum candidates shown to the user.
    pub display_cap: usize,
    /// Maximum raw glyphs considered before deduplication.
    pub extraction_cap: usize,
    pub degrade_delay_ms: u64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub line_width: f32,
    /// Luminance levels below white still counted as blank.
    pub blank_tolerance: u8,
    /// Fields requested from the dictionary when a candidate is selected.
    pub lookup_fields: LookupFields,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            cloud_endpoint: None,
            cloud_timeout_ms: 5000,
            tesseract_path: None,
            languages: "chi_sim+chi_tra".to_string(),
            page_segmentation_mode: 6,
            display_cap: 10,
            extraction_cap: 15,
            degrade_delay_ms: 300,
            canvas_width: 550,
            canvas_height: 350,
            line_width: 8.0,
            blank_tolerance: 8,
            lookup_fields: LookupFields::default(),
        }
    }
}

impl RecognizerConfig {
    /// Load defaults, then the config file, then env overrides.
    pub fn load() -> Self {
        let mut config = config_path()
            .map(|path| Self::from_file(&path))
            .unwrap_or_default();
        config.apply_env();
        log::info!(
            "[CONFIG] cloud={} timeout={}ms langs={} psm={}",
            config.cloud_endpoint.as_deref().unwrap_or("<disabled>"),
            config.cloud_timeout_ms,
            config.languages,
            config.page_segmentation_mode
        );
        config
    }

    /// Parse a JSON config file. Returns defaults if it is missing or invalid.
    pub fn from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("[CONFIG] Ignoring invalid {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Override fields from `HANZI_INK_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Some(endpoint) = env_non_empty("HANZI_INK_CLOUD_ENDPOINT") {
            self.cloud_endpoint = Some(endpoint);
        }
        if let Some(raw) = env_non_empty("HANZI_INK_CLOUD_TIMEOUT_MS") {
            match raw.parse() {
                Ok(ms) => self.cloud_timeout_ms = ms,
                Err(_) => log::warn!("[CONFIG] Invalid HANZI_INK_CLOUD_TIMEOUT_MS: {}", raw),
            }
        }
        if let Some(path) = env_non_empty("HANZI_INK_TESSERACT") {
            self.tesseract_path = Some(PathBuf::from(path));
        }
        if let Some(langs) = env_non_empty("HANZI_INK_LANGS") {
            self.languages = langs;
        }
    }

    pub fn cloud_timeout(&self) -> Duration {
        Duration::from_millis(self.cloud_timeout_ms)
    }

    pub fn degrade_delay(&self) -> Duration {
        Duration::from_millis(self.degrade_delay_ms)
    }
}

/// Path of the optional config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("hanzi-ink").join(CONFIG_FILE))
}

/// Resolve the cloud bearer token.
///
/// Priority: `HANZI_INK_CLOUD_TOKEN`, then the OS keychain.
pub fn cloud_token() -> Option<String> {
    if let Some(token) = env_non_empty("HANZI_INK_CLOUD_TOKEN") {
        return Some(token);
    }
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()?;
    match entry.get_password() {
        Ok(token) if !token.is_empty() => {
            log::info!("[CONFIG] Loaded cloud token from OS keychain");
            Some(token)
        }
        _ => None,
    }
}

/// Load `.env.local` then `.env` from the working directory, first hit wins.
///
/// Runs before the logger exists (so `RUST_LOG` can come from the file),
/// hence plain stderr.
pub fn load_env_files() {
    for env_file in [".env.local", ".env"] {
        let path = std::path::Path::new(env_file);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break;
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_ui() {
        let config = RecognizerConfig::default();
        assert_eq!((config.canvas_width, config.canvas_height), (550, 350));
        assert_eq!(config.display_cap, 10);
        assert_eq!(config.extraction_cap, 15);
        assert_eq!(config.languages, "chi_sim+chi_tra");
        assert_eq!(config.cloud_timeout(), Duration::from_secs(5));
        assert_eq!(config.lookup_fields, LookupFields::default());
    }

    #[test]
    fn missing_file_returns_defaults() {
        let path = std::env::temp_dir().join("hanzi-ink-config-test-missing.json");
        assert_eq!(RecognizerConfig::from_file(&path), RecognizerConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = std::env::temp_dir().join("hanzi-ink-config-test-partial.json");
        std::fs::write(&path, r#"{"cloudTimeoutMs": 1200, "displayCap": 6}"#).unwrap();
        let config = RecognizerConfig::from_file(&path);
        assert_eq!(config.cloud_timeout_ms, 1200);
        assert_eq!(config.display_cap, 6);
        assert_eq!(config.extraction_cap, 15);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn lookup_fields_from_file() {
        let path = std::env::temp_dir().join("hanzi-ink-config-test-fields.json");
        std::fs::write(&path, r#"{"lookupFields": {"explanation": false, "traditional": true}}"#).unwrap();
        let config = RecognizerConfig::from_file(&path);
        assert!(!config.lookup_fields.explanation);
        assert!(config.lookup_fields.traditional);
        assert!(config.lookup_fields.pinyin);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_file_returns_defaults() {
        let path = std::env::temp_dir().join("hanzi-ink-config-test-invalid.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(RecognizerConfig::from_file(&path), RecognizerConfig::default());
        let _ = std::fs::remove_file(&path);
    }
}
