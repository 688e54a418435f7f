//! Language registry
//!
//! Static mapping from a supported language tag to its recognition locale
//! and display metadata.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::LanguageError;

/// Supported conversation languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "mr")]
    Marathi,
}

impl Language {
    /// Every registered language, in display order
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Marathi];

    pub fn tag(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Marathi => "mr",
        }
    }

    /// Locale code used for recognition and as the synthesis fallback
    pub fn locale_code(&self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::Hindi => "hi-IN",
            Language::Marathi => "mr-IN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "हिंदी",
            Language::Marathi => "मराठी",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Language::English => "A",
            Language::Hindi => "अ",
            Language::Marathi => "म",
        }
    }

    /// Acceptable synthesis voice locale prefixes, most preferred first
    pub fn voice_prefixes(&self) -> &'static [&'static str] {
        match self {
            Language::English => &["en-US", "en-GB", "en"],
            Language::Hindi => &["hi-IN", "hi"],
            Language::Marathi => &["mr-IN", "mr"],
        }
    }

    pub fn info(&self) -> LanguageInfo {
        LanguageInfo {
            language: *self,
            locale_code: self.locale_code(),
            display_name: self.display_name(),
            glyph: self.glyph(),
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.tag() == tag)
            .ok_or_else(|| LanguageError::UnknownLanguage(s.to_string()))
    }
}

/// Registry entry for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    pub language: Language,
    pub locale_code: &'static str,
    pub display_name: &'static str,
    pub glyph: &'static str,
}

/// Look up a language tag in the registry
pub fn resolve(tag: &str) -> Result<LanguageInfo, LanguageError> {
    tag.parse::<Language>().map(|lang| lang.info())
}
