use thiserror::Error;

/// Document-level failures. Page-level problems never surface here; they
/// degrade the page to empty text instead.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Could not load PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Document has no extractable text on any of its {pages} pages")]
    NoExtractableText { pages: usize },

    #[error("Failed to build extraction pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to stage PDF for rasterization: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Extraction cancelled")]
    Cancelled,
}

/// Rasterization and recognition failures for a single page or region.
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("{tool} is not installed or not on PATH: {source}")]
    ToolUnavailable {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR engine already installed")]
    AlreadyInstalled,
}
