//! Cloud recognition tier: multipart PNG upload to a remote service.
//!
//! Contract:
//! - POST the raw (unpreprocessed) PNG as multipart field `image`
//! - 2xx body must be `{ "words": [ { "text": "...", "rate": 0.93 }, ... ] }`
//! - Anything else is a `RemoteTransportFailure`; the orchestrator then
//!   falls through to the local tier

use crate::results::RawGlyph;
use crate::RecognitionError;
use serde::Deserialize;
use std::time::Duration;

/// A recognized word with the service's confidence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CloudWord {
    pub text: String,
    pub rate: f64,
}

#[derive(Debug, Deserialize)]
struct CloudResponse {
    words: Vec<CloudWord>,
}

/// The remote tier as seen by the orchestrator.
#[allow(async_fn_in_trait)]
pub trait RemoteRecognizer: Send + Sync {
    /// Submit one PNG. A single attempt; no retries.
    async fn recognize(&self, png_bytes: Vec<u8>) -> Result<Vec<CloudWord>, RecognitionError>;
}

/// HTTP client for the remote recognition service.
pub struct CloudClient {
    client: reqwest::Client,
    endpoint: Option<String>,
    token: Option<String>,
}

impl CloudClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(
        endpoint: Option<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RecognitionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecognitionError::RemoteTransportFailure(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    pub fn from_config(config: &crate::config::RecognizerConfig) -> Result<Self, RecognitionError> {
        Self::new(
            config.cloud_endpoint.clone(),
            crate::config::cloud_token(),
            config.cloud_timeout(),
        )
    }
}

impl RemoteRecognizer for CloudClient {
    async fn recognize(&self, png_bytes: Vec<u8>) -> Result<Vec<CloudWord>, RecognitionError> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            RecognitionError::RemoteTransportFailure("cloud endpoint not configured".to_string())
        })?;

        let start = std::time::Instant::now();
        let size = png_bytes.len();
        let part = reqwest::multipart::Part::bytes(png_bytes)
            .file_name("ink.png")
            .mime_str("image/png")
            .map_err(|e| RecognitionError::RemoteTransportFailure(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let mut request = self.client.post(endpoint).multipart(form);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            let kind = if e.is_timeout() { "timed out" } else { "request failed" };
            RecognitionError::RemoteTransportFailure(format!("{}: {}", kind, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::RemoteTransportFailure(format!(
                "service returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RecognitionError::RemoteTransportFailure(e.to_string()))?;
        log::info!(
            "[CLOUD] {} bytes uploaded, {} in {}ms",
            size,
            status,
            start.elapsed().as_millis()
        );
        parse_response(&body)
    }
}

/// Parse the service body. Missing `words`, wrong types, or non-JSON
/// all fail the tier.
pub fn parse_response(body: &str) -> Result<Vec<CloudWord>, RecognitionError> {
    serde_json::from_str::<CloudResponse>(body)
        .map(|r| r.words)
        .map_err(|e| RecognitionError::RemoteTransportFailure(format!("invalid response: {}", e)))
}

/// Rank words by confidence, highest first, keeping response order on
/// ties, and flatten them into ideograph glyphs carrying their word's rate.
pub fn rank_words(mut words: Vec<CloudWord>) -> Vec<RawGlyph> {
    sort_by_rate(&mut words, |w| w.rate);
    words
        .iter()
        .flat_map(|word| {
            let confidence = word.rate.clamp(0.0, 1.0) as f32;
            super::heuristics::extract_ideographs(&word.text)
                .into_iter()
                .map(move |ch| RawGlyph::new(ch, Some(confidence)))
        })
        .collect()
}

/// Concatenated text of the ranked words, for logging.
pub fn ranked_text(words: &[CloudWord]) -> String {
    let mut sorted: Vec<&CloudWord> = words.iter().collect();
    sort_by_rate(&mut sorted, |w| w.rate);
    sorted.iter().map(|w| w.text.as_str()).collect()
}

/// Stable sort, highest rate first. NaN rates compare equal.
fn sort_by_rate<T>(items: &mut [T], rate: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| {
        rate(b)
            .partial_cmp(&rate(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
