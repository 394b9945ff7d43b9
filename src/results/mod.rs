//! Result aggregation: candidate ranking plus the manual-entry escape hatch.
//!
//! The aggregator turns the raw glyph stream from a recognition tier
//! into what the UI renders as clickable candidates.

use crate::recognize::heuristics::is_cjk_ideograph;
use crate::RecognitionError;
use serde::{Deserialize, Serialize};

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cloud,
    Local,
    Manual,
}

/// A glyph as extracted from a tier, before deduplication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawGlyph {
    pub ch: char,
    pub confidence: Option<f32>,
}

impl RawGlyph {
    pub fn new(ch: char, confidence: Option<f32>) -> Self {
        Self { ch, confidence }
    }
}

/// One candidate the user can pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub ch: char,
    pub confidence: Option<f32>,
    pub source: Source,
}

/// Ordered, duplicate-free candidates. The first entry is the default
/// selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    candidates: Vec<Candidate>,
}

impl ResultSet {
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// The default-selected candidate.
    pub fn first(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Candidate characters as a plain string, in rank order.
    pub fn chars(&self) -> String {
        self.candidates.iter().map(|c| c.ch).collect()
    }

    /// Source shared by all candidates, if any.
    pub fn source(&self) -> Option<Source> {
        self.candidates.first().map(|c| c.source)
    }
}

/// Deduplicates and caps candidate lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregator {
    display_cap: usize,
    extraction_cap: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(10, 15)
    }
}

impl Aggregator {
    /// `extraction_cap` bounds the raw stream before dedup; `display_cap`
    /// bounds the final set.
    pub fn new(display_cap: usize, extraction_cap: usize) -> Self {
        Self {
            display_cap,
            extraction_cap: extraction_cap.max(display_cap),
        }
    }

    pub fn from_config(config: &crate::config::RecognizerConfig) -> Self {
        Self::new(config.display_cap, config.extraction_cap)
    }

    /// Build a result set from a tier's raw glyphs.
    ///
    /// The first `extraction_cap` glyphs are kept, duplicates are dropped
    /// keeping the first occurrence, and the result is cut to
    /// `display_cap`. Ranking is the caller's order: the cloud tier hands
    /// glyphs over already sorted by confidence.
    pub fn consolidate(&self, raw: &[RawGlyph], source: Source) -> ResultSet {
        let mut candidates: Vec<Candidate> = Vec::new();
        for glyph in raw.iter().take(self.extraction_cap) {
            if candidates.len() == self.display_cap {
                break;
            }
            if candidates.iter().any(|c| c.ch == glyph.ch) {
                continue;
            }
            candidates.push(Candidate {
                ch: glyph.ch,
                confidence: glyph.confidence,
                source,
            });
        }
        log::info!(
            "[RESULTS] {} raw glyphs → {} candidates ({:?})",
            raw.len(),
            candidates.len(),
            source
        );
        ResultSet { candidates }
    }

    /// Validate a user-typed override and wrap it as a one-element set.
    pub fn manual_entry(&self, input: &str) -> Result<ResultSet, RecognitionError> {
        let mut chars = input.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if is_cjk_ideograph(ch) => Ok(ResultSet {
                candidates: vec![Candidate {
                    ch,
                    confidence: None,
                    source: Source::Manual,
                }],
            }),
            _ => Err(RecognitionError::InvalidManualCharacter(input.to_string())),
        }
    }
}

/// Raw glyphs without confidence, in text order.
pub fn glyphs_from_text(text: &str) -> Vec<RawGlyph> {
    crate::recognize::heuristics::extract_ideographs(text)
        .into_iter()
        .map(|ch| RawGlyph::new(ch, None))
        .collect()
}
