//! Structured run logging utilities.
//!
//! Provides consistent, structured logging for pipeline runs with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Run logger for structured logging with consistent formatting.
///
/// Every event carries the run id and the operation being performed, so
/// interleaved output from concurrent runs can be told apart.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    operation: String,
}

impl RunLogger {
    /// Create a logger with a fresh run id.
    pub fn new(operation: &str) -> Self {
        Self::with_id(&Uuid::new_v4().to_string(), operation)
    }

    /// Create a logger for an existing run id.
    pub fn with_id(run_id: &str, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of a run operation.
    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run started: {}", message
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run error: {}", message
        );
    }

    /// Log the completion of a run operation.
    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let logger = RunLogger::new("extract");
        assert_eq!(logger.operation(), "extract");
        assert!(Uuid::parse_str(logger.run_id()).is_ok());
        assert_ne!(logger.run_id(), RunLogger::new("extract").run_id());
    }

    #[test]
    fn test_run_logger_with_id() {
        let logger = RunLogger::with_id("run-123", "cut");
        assert_eq!(logger.run_id(), "run-123");
        assert_eq!(logger.operation(), "cut");
    }
}
