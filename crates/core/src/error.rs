use thiserror::Error;

/// Invalid settings. Always fatal, and always raised before any page is read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Unknown card type: {0} (expected basic, cloze or both)")]
    UnknownCardType(String),

    #[error("Unknown answer format: {0} (expected sentences or bullets)")]
    UnknownAnswerFormat(String),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Could not parse {key}={value}")]
    Parse { key: String, value: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            message: message.into(),
        }
    }
}
