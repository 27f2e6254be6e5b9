//! AI-backed moment extraction.
//!
//! This crate provides:
//! - A Gemini client behind the [`MomentModel`] trait
//! - Prompt construction and lenient parsing of model output
//! - Retry with backoff and model fallback
//! - An on-disk cache of extracted moments

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod metrics;
pub mod parse;
pub mod prompt;
pub mod retry;

pub use cache::MomentCache;
pub use client::{GeminiClient, MomentModel};
pub use config::{AiConfig, DEFAULT_BASE_URL, DEFAULT_MODELS};
pub use error::{AiError, AiResult, ExtractionError};
pub use extractor::MomentExtractor;
pub use parse::parse_moments;
pub use prompt::build_prompt;
pub use retry::{retry_async, RetryConfig, RetryResult};
