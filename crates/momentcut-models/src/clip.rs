//! Clip cutting results and output naming.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Outcome of cutting one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    Succeeded,
    Failed(String),
}

/// How the clip was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutMode {
    /// Packets copied without decoding.
    StreamCopy,
    /// Decoded and re-encoded for frame-accurate boundaries.
    Reencode,
}

impl CutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CutMode::StreamCopy => "stream_copy",
            CutMode::Reencode => "reencode",
        }
    }
}

/// Result for one validated segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipResult {
    pub segment_id: usize,
    pub output_path: PathBuf,
    pub status: ClipStatus,
    /// Measured duration of the written file, when it could be probed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_actual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_mode: Option<CutMode>,
}

impl ClipResult {
    pub fn succeeded(
        segment_id: usize,
        output_path: PathBuf,
        cut_mode: CutMode,
        duration_actual: Option<f64>,
    ) -> Self {
        Self {
            segment_id,
            output_path,
            status: ClipStatus::Succeeded,
            duration_actual,
            cut_mode: Some(cut_mode),
        }
    }

    pub fn failed(segment_id: usize, output_path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            segment_id,
            output_path,
            status: ClipStatus::Failed(reason.into()),
            duration_actual: None,
            cut_mode: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ClipStatus::Succeeded
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            ClipStatus::Failed(reason) => Some(reason),
            ClipStatus::Succeeded => None,
        }
    }
}

/// Aggregate of a cut batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutSummary {
    pub total: usize,
    pub succeeded: usize,
    /// `(segment_id, reason)` for every failed segment.
    pub failed: Vec<(usize, String)>,
}

impl CutSummary {
    pub fn from_results(results: &[ClipResult]) -> Self {
        let failed: Vec<(usize, String)> = results
            .iter()
            .filter_map(|r| r.failure_reason().map(|reason| (r.segment_id, reason.to_string())))
            .collect();
        Self {
            total: results.len(),
            succeeded: results.len() - failed.len(),
            failed,
        }
    }

    /// A batch succeeds when at least one clip was cut, or there was nothing to cut.
    pub fn is_success(&self) -> bool {
        self.total == 0 || self.succeeded > 0
    }
}

impl std::fmt::Display for CutSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed.len())
    }
}

/// Sanitize a title for use in filenames.
///
/// Keeps ASCII alphanumerics, hyphen, underscore and space; joins words with
/// underscores, lowercases and caps the length at 50 characters.
pub fn sanitize_filename_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .take(50)
        .collect()
}

/// Output file name for a segment: `{id:03}_{sanitized_title}.{ext}`.
pub fn clip_filename(segment_id: usize, title: &str, extension: &str) -> String {
    let mut name = sanitize_filename_title(title);
    if name.is_empty() {
        name = "clip".to_string();
    }
    format!("{:03}_{}.{}", segment_id, name, extension.trim_start_matches('.'))
}

/// Full output path for a segment inside `output_dir`.
pub fn clip_output_path(output_dir: &Path, segment_id: usize, title: &str, extension: &str) -> PathBuf {
    output_dir.join(clip_filename(segment_id, title, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_title() {
        assert_eq!(sanitize_filename_title("Hello World!"), "hello_world");
        assert_eq!(sanitize_filename_title("  Café  ná   Tip "), "caf_n_tip");
        assert_eq!(sanitize_filename_title(&"a".repeat(80)).len(), 50);
    }

    #[test]
    fn test_clip_filename() {
        assert_eq!(clip_filename(3, "The Big Reveal", "mp4"), "003_the_big_reveal.mp4");
        assert_eq!(clip_filename(12, "¿¿??", ".mov"), "012_clip.mov");
    }

    #[test]
    fn test_cut_summary() {
        let results = vec![
            ClipResult::succeeded(0, "a.mp4".into(), CutMode::StreamCopy, Some(4.0)),
            ClipResult::failed(1, "b.mp4".into(), "ffmpeg exited with status 1"),
        ];
        let summary = CutSummary::from_results(&results);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, vec![(1, "ffmpeg exited with status 1".to_string())]);
        assert!(summary.is_success());
        assert_eq!(summary.to_string(), "1 succeeded, 1 failed");

        let all_failed = CutSummary::from_results(&results[1..]);
        assert!(!all_failed.is_success());
        assert!(CutSummary::from_results(&[]).is_success());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&ClipStatus::Failed("boom".into())).unwrap();
        assert_eq!(json, r#"{"failed":"boom"}"#);
        let json = serde_json::to_string(&ClipStatus::Succeeded).unwrap();
        assert_eq!(json, r#""succeeded""#);
    }
}
