//! Shared data models for the MomentCut pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Time-coded transcripts
//! - Candidate moments and the segment validator
//! - Cut sheets, clip results and cut job descriptions
//! - Re-encode settings

pub mod clip;
pub mod cutsheet;
pub mod encoding;
pub mod job;
pub mod moment;
pub mod segment;
pub mod timestamp;
pub mod transcript;

// Re-export common types
pub use clip::{clip_filename, clip_output_path, sanitize_filename_title, ClipResult, ClipStatus, CutMode, CutSummary};
pub use cutsheet::{CutSheet, CutSheetEntry, ProductionNotes};
pub use encoding::EncodingConfig;
pub use job::{CutJob, JobEntry, JobError};
pub use moment::{CandidateMoment, MomentTime};
pub use segment::{
    check_segment_set, Rejection, RejectionReason, SegmentValidator, ValidatedSegment,
    ValidationError, ValidationReport, DEFAULT_MIN_CLIP_LENGTH,
};
pub use timestamp::{format_hms, format_precise, parse_timestamp, TimestampError};
pub use transcript::{normalize_spans, TimingSource, Transcript, TranscriptError, TranscriptSpan};
