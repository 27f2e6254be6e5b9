//! AI client and extraction errors.

use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

/// Errors from a single model call.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI configuration error: {0}")]
    Config(String),

    #[error("AI request failed: {0}")]
    Request(String),

    #[error("AI request timed out")]
    Timeout,

    #[error("AI service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("AI response could not be read: {0}")]
    InvalidResponse(String),

    #[error("AI output is not a usable moment list: {0}")]
    Parse(String),
}

impl AiError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transient failures worth another attempt: rate limits, server errors,
    /// timeouts, transport errors and unparsable output.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Http { status, .. } => *status == 429 || *status == 408 || *status >= 500,
            AiError::Request(_)
            | AiError::Timeout
            | AiError::InvalidResponse(_)
            | AiError::Parse(_) => true,
            AiError::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::Timeout
        } else if e.is_decode() {
            AiError::InvalidResponse(e.to_string())
        } else {
            // Drop the URL: it carries the API key.
            AiError::Request(e.without_url().to_string())
        }
    }
}

/// Why moment extraction failed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("transcript is empty; cannot extract moments")]
    EmptyTranscript,

    #[error("AI service failed after {attempts} attempts: {source}")]
    ServiceFailed {
        attempts: u32,
        #[source]
        source: AiError,
    },

    #[error("AI output was unparsable after {attempts} attempts: {detail}")]
    Unparsable { attempts: u32, detail: String },

    #[error("AI service returned no candidate moments")]
    NoCandidates,
}
