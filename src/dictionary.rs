//! Dictionary boundary: what happens when a candidate is selected.
//!
//! Pinyin, strokes, radicals and glosses come from an external lookup
//! capability. This crate treats them as opaque strings and only decides
//! whether a lookup is worth making.

use crate::recognize::heuristics::contains_chinese;
use serde::{Deserialize, Serialize};

/// Selections longer than this are refused instead of looked up.
pub const MAX_LOOKUP_CHARS: usize = 50;

/// Everything the external dictionary knows about a character or phrase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HanziInfo {
    pub text: String,
    pub pinyin: String,
    pub strokes: Vec<String>,
    pub radical: String,
    pub explanation: Vec<String>,
    pub traditional: String,
}

/// Which `HanziInfo` fields a lookup should fill. Traditional forms are
/// off unless asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LookupFields {
    pub pinyin: bool,
    pub strokes: bool,
    pub radical: bool,
    pub explanation: bool,
    pub traditional: bool,
}

impl Default for LookupFields {
    fn default() -> Self {
        Self {
            pinyin: true,
            strokes: true,
            radical: true,
            explanation: true,
            traditional: false,
        }
    }
}

impl LookupFields {
    /// Blank out every field that was not requested.
    pub fn mask(&self, mut info: HanziInfo) -> HanziInfo {
        if !self.pinyin {
            info.pinyin.clear();
        }
        if !self.strokes {
            info.strokes.clear();
        }
        if !self.radical {
            info.radical.clear();
        }
        if !self.explanation {
            info.explanation.clear();
        }
        if !self.traditional {
            info.traditional.clear();
        }
        info
    }
}

/// External lookup capability. Stateless from this crate's point of view.
///
/// Implementations may skip work for fields that are off in `fields`;
/// whatever they return is masked again by `describe`.
pub trait Dictionary: Send + Sync {
    fn lookup(&self, text: &str, fields: &LookupFields) -> Option<HanziInfo>;
}

/// Result of asking for a description of some text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LookupOutcome {
    Found(HanziInfo),
    TooLong { chars: usize },
    NotChinese,
    /// Text was valid but the dictionary had no entry.
    Unknown,
}

/// Look up `text`, refusing overlong or non-Chinese input up front.
/// Only the fields enabled in `fields` come back non-empty.
pub fn describe(dictionary: &dyn Dictionary, text: &str, fields: &LookupFields) -> LookupOutcome {
    let text = text.trim();
    let chars = text.chars().count();
    if chars > MAX_LOOKUP_CHARS {
        return LookupOutcome::TooLong { chars };
    }
    if !contains_chinese(text) {
        return LookupOutcome::NotChinese;
    }
    match dictionary.lookup(text, fields) {
        Some(info) => LookupOutcome::Found(fields.mask(info)),
        None => {
            log::debug!("[DICT] No entry for {:?}", text);
            LookupOutcome::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct OneEntry {
        calls: AtomicUsize,
    }

    impl Dictionary for OneEntry {
        fn lookup(&self, text: &str, _fields: &LookupFields) -> Option<HanziInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (text == "好").then(|| HanziInfo {
                text: "好".into(),
                pinyin: "hǎo".into(),
                strokes: vec!["㇛".into(), "㇒".into(), "㇀".into(), "㇇".into(), "亅".into(), "一".into()],
                radical: "女".into(),
                explanation: vec!["优点多的；使人满意的".into()],
                traditional: "好".into(),
            })
        }
    }

    #[test]
    fn found_entry_is_returned() {
        let dict = OneEntry::default();
        match describe(&dict, " 好 ", &LookupFields::default()) {
            LookupOutcome::Found(info) => {
                assert_eq!(info.pinyin, "hǎo");
                assert_eq!(info.strokes.len(), 6);
                assert_eq!(info.radical, "女");
                assert!(!info.explanation.is_empty());
                assert_eq!(info.traditional, "", "traditional is off by default");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overlong_and_non_chinese_skip_lookup() {
        let dict = OneEntry::default();
        let fields = LookupFields::default();
        assert_eq!(
            describe(&dict, &"好".repeat(51), &fields),
            LookupOutcome::TooLong { chars: 51 }
        );
        assert_eq!(describe(&dict, "hello", &fields), LookupOutcome::NotChinese);
        assert_eq!(dict.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fifty_chars_is_still_looked_up() {
        let dict = OneEntry::default();
        assert_eq!(
            describe(&dict, &"好".repeat(50), &LookupFields::default()),
            LookupOutcome::Unknown
        );
        assert_eq!(dict.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_fields_come_back_empty() {
        let dict = OneEntry::default();
        let fields = LookupFields {
            pinyin: false,
            strokes: false,
            radical: true,
            explanation: false,
            traditional: true,
        };
        match describe(&dict, "好", &fields) {
            LookupOutcome::Found(info) => {
                assert_eq!(info.text, "好");
                assert_eq!(info.pinyin, "");
                assert!(info.strokes.is_empty());
                assert!(info.explanation.is_empty());
                assert_eq!(info.radical, "女");
                assert_eq!(info.traditional, "好");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lookup_fields_parse_with_defaults() {
        let fields: LookupFields = serde_json::from_str(r#"{"traditional": true}"#).unwrap();
        assert!(fields.pinyin && fields.strokes && fields.radical && fields.explanation);
        assert!(fields.traditional);
    }
}
