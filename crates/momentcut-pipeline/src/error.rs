//! Pipeline error types.

use thiserror::Error;

use momentcut_ai::{AiError, ExtractionError};
use momentcut_media::MediaError;
use momentcut_models::{JobError, TranscriptError, ValidationError};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("AI client error: {0}")]
    Ai(#[from] AiError),

    #[error("Run cancelled before cutting")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
