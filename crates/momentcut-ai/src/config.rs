//! AI service configuration.

use std::time::Duration;

use crate::error::{AiError, AiResult};
use crate::retry::RetryConfig;

/// Default Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models tried in order when the previous one keeps failing.
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Configuration for the moment extraction service.
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub models: Vec<String>,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            timeout: Duration::from_secs(120),
            temperature: 0.3,
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl AiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            models: std::env::var("AI_MODELS")
                .ok()
                .map(|v| parse_model_list(&v))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.models),
            timeout: std::env::var("AI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            temperature: std::env::var("AI_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.temperature),
            max_retries: std::env::var("AI_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_delay: std::env::var("AI_RETRY_BASE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
        }
    }

    /// API key, or a configuration error naming the variable.
    pub fn require_api_key(&self) -> AiResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AiError::Config("GEMINI_API_KEY not set".to_string()))
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new("moment_extraction")
            .with_max_retries(self.max_retries)
            .with_base_delay(self.retry_base_delay)
    }
}

/// Split a comma-separated model list.
pub fn parse_model_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.models[0], "gemini-2.5-flash");
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_parse_model_list() {
        assert_eq!(
            parse_model_list(" gemini-2.5-pro, ,gemini-2.5-flash "),
            vec!["gemini-2.5-pro", "gemini-2.5-flash"]
        );
    }
}
