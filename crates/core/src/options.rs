//! Deck options that shape generation: card type, answer format, and the
//! output language.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ── Card type ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    #[default]
    Basic,
    Cloze,
    Both,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Basic => "basic",
            CardType::Cloze => "cloze",
            CardType::Both => "both",
        }
    }
}

impl FromStr for CardType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(CardType::Basic),
            "cloze" => Ok(CardType::Cloze),
            "both" | "mixed" => Ok(CardType::Both),
            other => Err(ConfigError::UnknownCardType(other.to_string())),
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Answer format ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerFormat {
    #[default]
    Sentences,
    Bullets,
}

impl AnswerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerFormat::Sentences => "sentences",
            AnswerFormat::Bullets => "bullets",
        }
    }
}

impl FromStr for AnswerFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sentences" | "sentence" => Ok(AnswerFormat::Sentences),
            "bullets" | "bullet" => Ok(AnswerFormat::Bullets),
            other => Err(ConfigError::UnknownAnswerFormat(other.to_string())),
        }
    }
}

impl fmt::Display for AnswerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Language ──────────────────────────────────────────────────

/// The twenty output languages cards can be written in.
///
/// Serialized as the ISO 639-1 code. Parsing accepts the code, the native
/// display name, or the English name, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    German,
    #[default]
    English,
    Spanish,
    French,
    Italian,
    Portuguese,
    Dutch,
    Polish,
    Czech,
    Russian,
    Turkish,
    Swedish,
    Norwegian,
    Danish,
    Finnish,
    Mandarin,
    Japanese,
    Korean,
    Arabic,
    Hindi,
}

impl Language {
    pub const ALL: [Language; 20] = [
        Language::German,
        Language::English,
        Language::Spanish,
        Language::French,
        Language::Italian,
        Language::Portuguese,
        Language::Dutch,
        Language::Polish,
        Language::Czech,
        Language::Russian,
        Language::Turkish,
        Language::Swedish,
        Language::Norwegian,
        Language::Danish,
        Language::Finnish,
        Language::Mandarin,
        Language::Japanese,
        Language::Korean,
        Language::Arabic,
        Language::Hindi,
    ];

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::German => "de",
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Dutch => "nl",
            Language::Polish => "pl",
            Language::Czech => "cs",
            Language::Russian => "ru",
            Language::Turkish => "tr",
            Language::Swedish => "sv",
            Language::Norwegian => "no",
            Language::Danish => "da",
            Language::Finnish => "fi",
            Language::Mandarin => "zh",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Arabic => "ar",
            Language::Hindi => "hi",
        }
    }

    /// Name of the language in the language itself; used in prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::German => "Deutsch",
            Language::English => "English",
            Language::Spanish => "Español",
            Language::French => "Français",
            Language::Italian => "Italiano",
            Language::Portuguese => "Português",
            Language::Dutch => "Nederlands",
            Language::Polish => "Polski",
            Language::Czech => "Čeština",
            Language::Russian => "Русский",
            Language::Turkish => "Türkçe",
            Language::Swedish => "Svenska",
            Language::Norwegian => "Norsk",
            Language::Danish => "Dansk",
            Language::Finnish => "Suomi",
            Language::Mandarin => "中文 (Mandarin)",
            Language::Japanese => "日本語",
            Language::Korean => "한국어",
            Language::Arabic => "العربية",
            Language::Hindi => "हिन्दी",
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Language::German => "German",
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::Italian => "Italian",
            Language::Portuguese => "Portuguese",
            Language::Dutch => "Dutch",
            Language::Polish => "Polish",
            Language::Czech => "Czech",
            Language::Russian => "Russian",
            Language::Turkish => "Turkish",
            Language::Swedish => "Swedish",
            Language::Norwegian => "Norwegian",
            Language::Danish => "Danish",
            Language::Finnish => "Finnish",
            Language::Mandarin => "Mandarin",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Arabic => "Arabic",
            Language::Hindi => "Hindi",
        }
    }

    /// Tesseract traineddata name for documents written in this language.
    pub fn tesseract_code(&self) -> &'static str {
        match self {
            Language::German => "deu",
            Language::English => "eng",
            Language::Spanish => "spa",
            Language::French => "fra",
            Language::Italian => "ita",
            Language::Portuguese => "por",
            Language::Dutch => "nld",
            Language::Polish => "pol",
            Language::Czech => "ces",
            Language::Russian => "rus",
            Language::Turkish => "tur",
            Language::Swedish => "swe",
            Language::Norwegian => "nor",
            Language::Danish => "dan",
            Language::Finnish => "fin",
            Language::Mandarin => "chi_sim",
            Language::Japanese => "jpn",
            Language::Korean => "kor",
            Language::Arabic => "ara",
            Language::Hindi => "hin",
        }
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| {
                lang.code() == needle
                    || lang.display_name().to_lowercase() == needle
                    || lang.english_name().to_lowercase() == needle
            })
            .ok_or_else(|| ConfigError::UnsupportedLanguage(s.trim().to_string()))
    }
}

impl TryFrom<String> for Language {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.code().to_string()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
