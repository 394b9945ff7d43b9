//! Character-class heuristics for recognizer output.
//!
//! Recognizers return free-form text: Latin noise, punctuation, stray
//! digits and line breaks around the glyphs we want. These helpers pick
//! out the Chinese ideographs.

/// Returns true if `ch` is a CJK unified or compatibility ideograph.
///
/// Covers the basic block, extensions A through H, and both
/// compatibility blocks. Radicals, strokes and CJK punctuation are not
/// ideographs and are rejected.
pub fn is_cjk_ideograph(ch: char) -> bool {
    matches!(
        ch as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2EBEF
            | 0x30000..=0x323AF
            | 0xF900..=0xFAFF
            | 0x2F800..=0x2FA1F
    )
}

/// Returns true if the text contains at least one Chinese character.
pub fn contains_chinese(text: &str) -> bool {
    text.chars().any(is_cjk_ideograph)
}

/// Extract the ideographs from recognizer text, in order of appearance.
///
/// Duplicates are kept; deduplication is the aggregator's job.
pub fn extract_ideographs(text: &str) -> Vec<char> {
    text.chars().filter(|c| is_cjk_ideograph(*c)).collect()
}
