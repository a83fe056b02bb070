pub mod config;
pub mod error;
pub mod options;

pub use config::{LlmConfig, OllamaConfig, PipelineConfig, PipelineOverrides};
pub use error::*;
pub use options::{AnswerFormat, CardType, Language};
