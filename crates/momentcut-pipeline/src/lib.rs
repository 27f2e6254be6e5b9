//! Transcript-to-clip pipeline.
//!
//! This crate wires the stages together:
//! - Transcript parsing (JSON, WebVTT, SRT, bracketed timestamps, plain text)
//! - Moment extraction and segment validation
//! - Cut sheet production notes and exports (CSV, Markdown, PDF, cut job)
//! - Clip cutting with a per-run results file

pub mod config;
pub mod cutsheet;
pub mod error;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod transcript_source;

pub use config::{CacheConfig, MediaToolConfig, PipelineConfig, ValidatorConfig, DEFAULT_TARGET_COUNT};
pub use cutsheet::CutSheetBuilder;
pub use error::{PipelineError, PipelineResult};
pub use export::{export, ExportFormat, JobTarget};
pub use logging::RunLogger;
pub use pipeline::{
    CutOutcome, Extraction, Pipeline, ResultsRecord, RunReport, CUT_SHEET_FILE, RESULTS_FILE,
};
pub use transcript_source::{TranscriptFormat, TranscriptSource};
