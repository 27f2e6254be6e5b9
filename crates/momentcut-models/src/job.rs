//! Machine-readable cut job description.
//!
//! The job is a JSON array with one entry per segment. Each entry carries the
//! cutting inputs (input path, times, output path) and the segment identity so
//! that re-parsing a job yields the original segment list.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clip::clip_output_path;
use crate::segment::{check_segment_set, SegmentFields, ValidatedSegment, ValidationError};

/// Job parsing errors.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid job JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("job entry {index} is invalid: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("job mixes input files: {0} and {1}")]
    MixedInputs(PathBuf, PathBuf),
}

/// One segment to cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEntry {
    pub segment_id: usize,
    pub input_path: PathBuf,
    pub start_time: f64,
    pub end_time: f64,
    pub output_path: PathBuf,
    pub title: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Ordered cut job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CutJob {
    pub entries: Vec<JobEntry>,
}

impl CutJob {
    /// Describe how to cut `segments` out of `media_path` into `output_dir`.
    pub fn from_segments(
        media_path: &Path,
        output_dir: &Path,
        segments: &[ValidatedSegment],
        extension: &str,
    ) -> Self {
        let entries = segments
            .iter()
            .map(|segment| {
                let fields = segment.to_fields();
                JobEntry {
                    segment_id: fields.id,
                    input_path: media_path.to_path_buf(),
                    start_time: fields.start_time,
                    end_time: fields.end_time,
                    output_path: clip_output_path(output_dir, fields.id, &fields.title, extension),
                    title: fields.title,
                    rationale: fields.rationale,
                    virality_score: fields.virality_score,
                    quote: fields.quote,
                    hook_category: fields.hook_category,
                    caption: fields.caption,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn to_json(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Shared input path, if the job is non-empty.
    pub fn input_path(&self) -> Result<Option<&Path>, JobError> {
        let mut entries = self.entries.iter();
        let Some(first) = entries.next() else {
            return Ok(None);
        };
        for entry in entries {
            if entry.input_path != first.input_path {
                return Err(JobError::MixedInputs(
                    first.input_path.clone(),
                    entry.input_path.clone(),
                ));
            }
        }
        Ok(Some(&first.input_path))
    }

    /// Rebuild the validated segment list, re-checking every invariant.
    pub fn into_segments(self) -> Result<Vec<ValidatedSegment>, JobError> {
        let segments = self
            .entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                ValidatedSegment::try_from(SegmentFields {
                    id: entry.segment_id,
                    start_time: entry.start_time,
                    end_time: entry.end_time,
                    title: entry.title,
                    rationale: entry.rationale,
                    virality_score: entry.virality_score,
                    quote: entry.quote,
                    hook_category: entry.hook_category,
                    caption: entry.caption,
                })
                .map_err(|source| JobError::InvalidEntry { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        check_segment_set(&segments, None, 0.0)?;
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moment::CandidateMoment;
    use crate::segment::SegmentValidator;

    fn segments() -> Vec<ValidatedSegment> {
        let mut first = CandidateMoment::new(0, "Cold Open", 1.0 / 3.0, 12.7);
        first.quote = Some("you won't believe it".into());
        first.virality_score = Some(0.91);
        let candidates = vec![
            first.with_rationale("strong hook"),
            CandidateMoment::new(1, "Twist", 30.125, 47.0),
        ];
        SegmentValidator::default()
            .validate(&candidates, 60.0)
            .unwrap()
            .segments
    }

    #[test]
    fn test_job_round_trip_preserves_segments() {
        let original = segments();
        let job = CutJob::from_segments(
            Path::new("/media/talk.mp4"),
            Path::new("/out"),
            &original,
            "mp4",
        );
        assert_eq!(job.entries[0].output_path, PathBuf::from("/out/000_cold_open.mp4"));

        let json = job.to_json().unwrap();
        let parsed = CutJob::from_json(&json).unwrap();
        assert_eq!(parsed.input_path().unwrap(), Some(Path::new("/media/talk.mp4")));
        assert_eq!(parsed.into_segments().unwrap(), original);
    }

    #[test]
    fn test_job_is_a_json_list() {
        let job = CutJob::from_segments(Path::new("in.mp4"), Path::new("out"), &segments(), "mp4");
        let value: serde_json::Value = serde_json::from_str(&job.to_json().unwrap()).unwrap();
        assert!(value.is_array());
        assert_eq!(value[1]["start_time"], 30.125);
    }

    #[test]
    fn test_rejects_overlapping_entries() {
        let json = r#"[
            {"segment_id":0,"input_path":"a.mp4","start_time":0.0,"end_time":10.0,"output_path":"o/0.mp4","title":"a"},
            {"segment_id":1,"input_path":"a.mp4","start_time":5.0,"end_time":12.0,"output_path":"o/1.mp4","title":"b"}
        ]"#;
        let job = CutJob::from_json(json).unwrap();
        assert!(matches!(job.into_segments(), Err(JobError::Validation(_))));
    }

    #[test]
    fn test_rejects_reversed_entry() {
        let json = r#"[{"segment_id":0,"input_path":"a.mp4","start_time":9.0,"end_time":1.0,"output_path":"o.mp4","title":"a"}]"#;
        let job = CutJob::from_json(json).unwrap();
        assert!(matches!(
            job.into_segments(),
            Err(JobError::InvalidEntry { index: 0, .. })
        ));
    }

    #[test]
    fn test_empty_job() {
        let job = CutJob::from_json("[]").unwrap();
        assert_eq!(job.input_path().unwrap(), None);
        assert!(job.into_segments().unwrap().is_empty());
    }
}
