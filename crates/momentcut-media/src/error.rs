//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing or cutting media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found (looked for '{0}')")]
    FfmpegNotFound(String),

    #[error("FFprobe not found (looked for '{0}')")]
    FfprobeNotFound(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Output file is missing or empty: {0}")]
    EmptyOutput(PathBuf),

    #[error("Invalid segment list: {0}")]
    InvalidSegments(String),

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Short reason suitable for a per-clip failure record.
    ///
    /// FFmpeg failures include the last non-empty stderr line.
    pub fn reason(&self) -> String {
        match self {
            Self::FfmpegFailed {
                message, stderr, ..
            } => match stderr.as_deref().and_then(last_line) {
                Some(line) => format!("{message}: {line}"),
                None => message.clone(),
            },
            other => other.to_string(),
        }
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}
