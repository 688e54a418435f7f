//! Voice selection
//!
//! Picks a synthesis voice for a language from whatever catalog the
//! platform exposes, and guesses the language of a reply from its script
//! when no explicit language is given.
//!
//! Language detection is approximate: it only looks at Unicode script
//! ranges. Devanagari text is Hindi unless it contains one of a handful of
//! code points that are used in Marathi but not Hindi.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Devanagari block
const DEVANAGARI: std::ops::RangeInclusive<char> = '\u{0900}'..='\u{097F}';

/// Code points that upgrade Devanagari text from Hindi to Marathi
const MARATHI_MARKERS: [char; 2] = ['\u{0950}', '\u{0972}'];

/// A synthesis voice offered by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP-47 style locale, e.g. `en-US`
    pub locale: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locale: locale.into(),
        }
    }
}

/// Classify text by script
pub fn detect_language(text: &str) -> Language {
    let mut devanagari = false;
    for ch in text.chars() {
        if MARATHI_MARKERS.contains(&ch) {
            return Language::Marathi;
        }
        if DEVANAGARI.contains(&ch) {
            devanagari = true;
        }
    }

    if devanagari {
        Language::Hindi
    } else {
        Language::English
    }
}

/// Pick the best voice for a language
///
/// Tries each acceptable locale prefix in order and returns the first voice
/// whose locale starts with it. Falls back to the first voice in the
/// catalog; `None` only when the catalog is empty.
pub fn select_voice(voices: &[Voice], language: Language) -> Option<&Voice> {
    language
        .voice_prefixes()
        .iter()
        .find_map(|prefix| voices.iter().find(|v| v.locale.starts_with(prefix)))
        .or_else(|| voices.first())
}

/// Resolved voice and locale for one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePlan {
    pub language: Language,
    pub voice: Option<Voice>,
    pub locale: String,
}

/// Decide how to speak `text`
///
/// An explicit language wins over detection. When a voice is chosen its own
/// locale is used; otherwise the language's registry locale.
pub fn plan_voice(voices: &[Voice], text: &str, explicit: Option<Language>) -> VoicePlan {
    let language = explicit.unwrap_or_else(|| detect_language(text));
    let voice = select_voice(voices, language).cloned();
    let locale = voice
        .as_ref()
        .map(|v| v.locale.clone())
        .unwrap_or_else(|| language.locale_code().to_string());

    VoicePlan {
        language,
        voice,
        locale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Voice> {
        vec![
            Voice::new("Amelie", "fr-FR"),
            Voice::new("Daniel", "en-GB"),
            Voice::new("Lekha", "hi-IN"),
            Voice::new("Samantha", "en-US"),
        ]
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("Hello there"), Language::English);
        assert_eq!(detect_language("नमस्ते, आप कैसे हैं?"), Language::Hindi);
        assert_eq!(detect_language("ॲप उघडा"), Language::Marathi);
        assert_eq!(detect_language("ॐ"), Language::Marathi);
        assert_eq!(detect_language(""), Language::English);
    }

    #[test]
    fn test_ascii_never_detected_as_devanagari() {
        let ascii: String = (0u8..128).map(char::from).collect();
        assert_eq!(detect_language(&ascii), Language::English);
        assert_eq!(detect_language("Namaste! kaise ho?"), Language::English);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let text = "मी ठीक आहे, thanks";
        let first = detect_language(text);
        for _ in 0..10 {
            assert_eq!(detect_language(text), first);
        }
    }

    #[test]
    fn test_prefix_order_is_respected() {
        let voices = catalog();
        // en-US beats en-GB even though en-GB comes first in the catalog
        assert_eq!(select_voice(&voices, Language::English).unwrap().name, "Samantha");
        assert_eq!(select_voice(&voices, Language::Hindi).unwrap().name, "Lekha");
    }

    #[test]
    fn test_bare_prefix_matches() {
        let voices = vec![Voice::new("Generic", "en"), Voice::new("Aditi", "hi")];
        assert_eq!(select_voice(&voices, Language::English).unwrap().name, "Generic");
        assert_eq!(select_voice(&voices, Language::Hindi).unwrap().name, "Aditi");
    }

    #[test]
    fn test_fallback_to_first_voice() {
        let voices = vec![Voice::new("Amelie", "fr-FR")];
        let chosen = select_voice(&voices, Language::English);
        assert_eq!(chosen, Some(&voices[0]));

        // No Marathi voice in the catalog, first entry wins
        assert_eq!(select_voice(&catalog(), Language::Marathi).unwrap().name, "Amelie");
    }

    #[test]
    fn test_empty_catalog() {
        assert!(select_voice(&[], Language::Hindi).is_none());
    }

    #[test]
    fn test_plan_voice_uses_voice_locale() {
        let plan = plan_voice(&catalog(), "नमस्ते", None);
        assert_eq!(plan.language, Language::Hindi);
        assert_eq!(plan.voice.unwrap().name, "Lekha");
        assert_eq!(plan.locale, "hi-IN");
    }

    #[test]
    fn test_plan_voice_falls_back_to_registry_locale() {
        let plan = plan_voice(&[], "नमस्कार ॲ", None);
        assert_eq!(plan.language, Language::Marathi);
        assert!(plan.voice.is_none());
        assert_eq!(plan.locale, "mr-IN");
    }

    #[test]
    fn test_plan_voice_explicit_language_wins() {
        let plan = plan_voice(&catalog(), "Hello", Some(Language::Hindi));
        assert_eq!(plan.language, Language::Hindi);
        assert_eq!(plan.locale, "hi-IN");
    }
}
