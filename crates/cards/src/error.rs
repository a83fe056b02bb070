use thiserror::Error;

use pdfdeck_core::ConfigError;
use pdfdeck_ingest::IngestError;
use pdfdeck_llm::LlmError;

/// Failure of one generation call. The job logs it and moves on.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Unusable card payload: {0}")]
    Payload(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing deck: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize deck: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(IngestError),

    #[error("Extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Job cancelled")]
    Cancelled,
}

impl From<IngestError> for JobError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Cancelled => JobError::Cancelled,
            other => JobError::Ingest(other),
        }
    }
}
