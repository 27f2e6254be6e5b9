//! Validated segments and the validator that produces them.
//!
//! [`SegmentValidator::validate`] is the only way to obtain a fresh
//! [`ValidatedSegment`]. Deserialization re-checks the per-segment bounds, and
//! [`check_segment_set`] re-checks ordering for sets loaded from disk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::moment::CandidateMoment;

/// Default minimum clip length in seconds.
pub const DEFAULT_MIN_CLIP_LENGTH: f64 = 3.0;

/// A time-coded segment that passed validation.
///
/// Invariant: `0 <= start_time < end_time`, both finite. Within a validated
/// set, segments are sorted, non-overlapping and ids run `0..N`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SegmentFields")]
pub struct ValidatedSegment {
    id: usize,
    start_time: f64,
    end_time: f64,
    title: String,
    rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    virality_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hook_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
}

/// Unchecked wire form of [`ValidatedSegment`].
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SegmentFields {
    pub id: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub title: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub virality_score: Option<f64>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub hook_category: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl TryFrom<SegmentFields> for ValidatedSegment {
    type Error = ValidationError;

    fn try_from(fields: SegmentFields) -> Result<Self, Self::Error> {
        let valid = fields.start_time.is_finite()
            && fields.end_time.is_finite()
            && fields.start_time >= 0.0
            && fields.start_time < fields.end_time;
        if !valid {
            return Err(ValidationError::InvalidSegment(format!(
                "segment {} has invalid bounds {}..{}",
                fields.id, fields.start_time, fields.end_time
            )));
        }
        Ok(Self {
            id: fields.id,
            start_time: fields.start_time,
            end_time: fields.end_time,
            title: fields.title,
            rationale: fields.rationale,
            virality_score: fields.virality_score,
            quote: fields.quote,
            hook_category: fields.hook_category,
            caption: fields.caption,
        })
    }
}

impl ValidatedSegment {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn virality_score(&self) -> Option<f64> {
        self.virality_score
    }

    pub fn quote(&self) -> Option<&str> {
        self.quote.as_deref()
    }

    pub fn hook_category(&self) -> Option<&str> {
        self.hook_category.as_deref()
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub(crate) fn to_fields(&self) -> SegmentFields {
        SegmentFields {
            id: self.id,
            start_time: self.start_time,
            end_time: self.end_time,
            title: self.title.clone(),
            rationale: self.rationale.clone(),
            virality_score: self.virality_score,
            quote: self.quote.clone(),
            hook_category: self.hook_category.clone(),
            caption: self.caption.clone(),
        }
    }
}

/// Why a candidate did not make it into the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Times were missing, non-numeric, negative or reversed.
    Malformed { detail: String },
    /// Shorter than the minimum after clamping to the media duration.
    TooShort { length: f64, min: f64 },
    /// Shorter than the minimum after yielding to a later segment.
    Overlap { length: f64, min: f64, next_rank: usize },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { detail } => write!(f, "malformed timestamps: {detail}"),
            Self::TooShort { length, min } => {
                write!(f, "too short: {length:.2}s after clamping (minimum {min:.2}s)")
            }
            Self::Overlap {
                length,
                min,
                next_rank,
            } => write!(
                f,
                "overlaps candidate #{next_rank}: {length:.2}s left after truncation (minimum {min:.2}s)"
            ),
        }
    }
}

/// A rejected candidate, identified by its AI rank and title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub rank: usize,
    pub title: String,
    pub reason: RejectionReason,
}

/// Output of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub segments: Vec<ValidatedSegment>,
    pub rejections: Vec<Rejection>,
    pub rejected_malformed: usize,
    pub rejected_too_short: usize,
    pub rejected_overlap: usize,
    /// Candidates whose end time was pulled back to the media duration.
    pub clamped: usize,
    /// Segments whose end time was pulled back to a later segment's start.
    pub truncated: usize,
}

/// Validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("media duration must be positive and finite, got {0}")]
    InvalidDuration(f64),

    #[error("all {total} candidate moments were rejected")]
    AllRejected {
        total: usize,
        rejections: Vec<Rejection>,
    },

    #[error("invalid segment: {0}")]
    InvalidSegment(String),
}

/// Reconciles candidate moments against the media duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentValidator {
    min_clip_length: f64,
}

impl Default for SegmentValidator {
    fn default() -> Self {
        Self {
            min_clip_length: DEFAULT_MIN_CLIP_LENGTH,
        }
    }
}

struct Survivor<'a> {
    candidate: &'a CandidateMoment,
    start: f64,
    end: f64,
}

impl SegmentValidator {
    /// Create a validator. Non-finite or negative lengths fall back to zero.
    pub fn new(min_clip_length: f64) -> Self {
        let min_clip_length = if min_clip_length.is_finite() {
            min_clip_length.max(0.0)
        } else {
            0.0
        };
        Self { min_clip_length }
    }

    pub fn min_clip_length(&self) -> f64 {
        self.min_clip_length
    }

    /// Validate candidates against `duration`.
    ///
    /// Malformed and too-short candidates are dropped, survivors are sorted by
    /// start time (ties by rank), overlaps are resolved by truncating the
    /// earlier segment, and ids are assigned in final order.
    pub fn validate(
        &self,
        candidates: &[CandidateMoment],
        duration: f64,
    ) -> Result<ValidationReport, ValidationError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ValidationError::InvalidDuration(duration));
        }

        let min = self.min_clip_length;
        let mut report = ValidationReport::default();
        let mut survivors: Vec<Survivor<'_>> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let (start, end) = match (candidate.start_time.seconds(), candidate.end_time.seconds()) {
                (Some(start), Some(end)) if start < end => (start, end),
                (Some(start), Some(end)) => {
                    report.reject_malformed(
                        candidate,
                        format!("start {start} is not before end {end}"),
                    );
                    continue;
                }
                _ => {
                    report.reject_malformed(
                        candidate,
                        format!(
                            "start {} / end {}",
                            candidate.start_time, candidate.end_time
                        ),
                    );
                    continue;
                }
            };

            let clamped_end = end.min(duration);
            let length = clamped_end - start;
            if length < min || length <= 0.0 {
                report.rejected_too_short += 1;
                report.rejections.push(Rejection {
                    rank: candidate.rank,
                    title: candidate.title.clone(),
                    reason: RejectionReason::TooShort {
                        length: length.max(0.0),
                        min,
                    },
                });
                continue;
            }
            if clamped_end < end {
                report.clamped += 1;
            }

            survivors.push(Survivor {
                candidate,
                start,
                end: clamped_end,
            });
        }

        survivors.sort_by(|a, b| {
            a.start
                .total_cmp(&b.start)
                .then(a.candidate.rank.cmp(&b.candidate.rank))
        });

        let mut kept: Vec<Survivor<'_>> = Vec::with_capacity(survivors.len());
        for current in survivors {
            if let Some(previous) = kept.last_mut() {
                if current.start < previous.end {
                    previous.end = current.start;
                    report.truncated += 1;
                    let length = previous.end - previous.start;
                    if length < min || length <= 0.0 {
                        if let Some(dropped) = kept.pop() {
                            report.truncated -= 1;
                            report.rejected_overlap += 1;
                            report.rejections.push(Rejection {
                                rank: dropped.candidate.rank,
                                title: dropped.candidate.title.clone(),
                                reason: RejectionReason::Overlap {
                                    length,
                                    min,
                                    next_rank: current.candidate.rank,
                                },
                            });
                        }
                    }
                }
            }
            kept.push(current);
        }

        report.segments = kept
            .into_iter()
            .enumerate()
            .map(|(id, survivor)| ValidatedSegment {
                id,
                start_time: survivor.start,
                end_time: survivor.end,
                title: survivor.candidate.title.clone(),
                rationale: survivor.candidate.rationale.clone(),
                virality_score: survivor.candidate.virality_score,
                quote: survivor.candidate.quote.clone(),
                hook_category: survivor.candidate.hook_category.clone(),
                caption: survivor.candidate.caption.clone(),
            })
            .collect();

        if !candidates.is_empty() && report.segments.is_empty() {
            return Err(ValidationError::AllRejected {
                total: candidates.len(),
                rejections: report.rejections,
            });
        }

        Ok(report)
    }
}

impl ValidationReport {
    fn reject_malformed(&mut self, candidate: &CandidateMoment, detail: String) {
        self.rejected_malformed += 1;
        self.rejections.push(Rejection {
            rank: candidate.rank,
            title: candidate.title.clone(),
            reason: RejectionReason::Malformed { detail },
        });
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected_malformed + self.rejected_too_short + self.rejected_overlap
    }
}

/// Check that a loaded segment set still has validator shape: ids `0..N` in
/// order, sorted, non-overlapping, at least `min_clip_length` long and within
/// `duration` when known.
pub fn check_segment_set(
    segments: &[ValidatedSegment],
    duration: Option<f64>,
    min_clip_length: f64,
) -> Result<(), ValidationError> {
    let mut previous_end = 0.0;
    for (index, segment) in segments.iter().enumerate() {
        if segment.id != index {
            return Err(ValidationError::InvalidSegment(format!(
                "expected segment id {index}, found {}",
                segment.id
            )));
        }
        if segment.duration() < min_clip_length {
            return Err(ValidationError::InvalidSegment(format!(
                "segment {} is {:.3}s long, below minimum {:.3}s",
                segment.id,
                segment.duration(),
                min_clip_length
            )));
        }
        if segment.start_time < previous_end {
            return Err(ValidationError::InvalidSegment(format!(
                "segment {} starts at {} before the previous segment ends at {}",
                segment.id, segment.start_time, previous_end
            )));
        }
        if let Some(duration) = duration {
            if segment.end_time > duration {
                return Err(ValidationError::InvalidSegment(format!(
                    "segment {} ends at {} past the media duration {}",
                    segment.id, segment.end_time, duration
                )));
            }
        }
        previous_end = segment.end_time;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moment::MomentTime;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn bounds(report: &ValidationReport) -> Vec<(f64, f64)> {
        report
            .segments
            .iter()
            .map(|s| (s.start_time(), s.end_time()))
            .collect()
    }

    #[test]
    fn test_overlap_truncates_earlier_segment() {
        let candidates = vec![
            CandidateMoment::new(0, "a", 0.0, 10.0),
            CandidateMoment::new(1, "b", 8.0, 20.0),
            CandidateMoment::new(2, "c", 50.0, 52.0),
        ];
        let report = SegmentValidator::new(2.0).validate(&candidates, 100.0).unwrap();
        assert_eq!(bounds(&report), vec![(0.0, 8.0), (8.0, 20.0), (50.0, 52.0)]);
        assert_eq!(report.truncated, 1);
        let ids: Vec<usize> = report.segments.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_default_minimum_drops_two_second_moment() {
        let candidates = vec![
            CandidateMoment::new(0, "a", 0.0, 10.0),
            CandidateMoment::new(1, "b", 8.0, 20.0),
            CandidateMoment::new(2, "c", 50.0, 52.0),
        ];
        let report = SegmentValidator::default().validate(&candidates, 100.0).unwrap();
        assert_eq!(bounds(&report), vec![(0.0, 8.0), (8.0, 20.0)]);
        assert_eq!(report.rejected_too_short, 1);
    }

    #[test]
    fn test_equal_start_and_end_is_malformed() {
        let candidates = vec![
            CandidateMoment::new(0, "zero", 5.0, 5.0),
            CandidateMoment::new(1, "ok", 10.0, 20.0),
        ];
        let report = SegmentValidator::default().validate(&candidates, 60.0).unwrap();
        assert_eq!(report.rejected_malformed, 1);
        assert_eq!(report.rejections[0].rank, 0);
        assert_eq!(report.segments.len(), 1);
    }

    #[test]
    fn test_end_past_duration_is_clamped() {
        let candidates = vec![CandidateMoment::new(0, "tail", 90.0, 101.0)];
        let report = SegmentValidator::default().validate(&candidates, 100.0).unwrap();
        assert_eq!(bounds(&report), vec![(90.0, 100.0)]);
        assert_eq!(report.clamped, 1);
    }

    #[test]
    fn test_clamped_below_minimum_is_rejected() {
        let candidates = vec![
            CandidateMoment::new(0, "tail", 98.5, 110.0),
            CandidateMoment::new(1, "after", 120.0, 130.0),
            CandidateMoment::new(2, "ok", 10.0, 20.0),
        ];
        let report = SegmentValidator::default().validate(&candidates, 100.0).unwrap();
        assert_eq!(report.rejected_too_short, 2);
        assert_eq!(report.segments.len(), 1);
    }

    #[test]
    fn test_malformed_values() {
        let mut text_time = CandidateMoment::new(0, "text", 0.0, 10.0);
        text_time.start_time = MomentTime::Malformed("the beginning".into());
        let candidates = vec![
            text_time,
            CandidateMoment::new(1, "negative", -4.0, 10.0),
            CandidateMoment::new(2, "reversed", 30.0, 20.0),
            CandidateMoment::new(3, "nan", f64::NAN, 10.0),
            CandidateMoment::new(4, "good", 40.0, 50.0),
        ];
        let report = SegmentValidator::default().validate(&candidates, 100.0).unwrap();
        assert_eq!(report.rejected_malformed, 4);
        assert_eq!(report.segments.len(), 1);
        assert_eq!(report.segments[0].title(), "good");
    }

    #[test]
    fn test_overlap_drop_below_minimum() {
        let candidates = vec![
            CandidateMoment::new(0, "early", 10.0, 30.0),
            CandidateMoment::new(1, "late", 11.0, 25.0),
        ];
        let report = SegmentValidator::default().validate(&candidates, 100.0).unwrap();
        assert_eq!(bounds(&report), vec![(11.0, 25.0)]);
        assert_eq!(report.rejected_overlap, 1);
        assert!(matches!(
            report.rejections[0].reason,
            RejectionReason::Overlap { next_rank: 1, .. }
        ));
        assert_eq!(report.segments[0].id(), 0);
    }

    #[test]
    fn test_same_start_keeps_later_rank() {
        let candidates = vec![
            CandidateMoment::new(1, "second pick", 10.0, 15.0),
            CandidateMoment::new(0, "first pick", 10.0, 20.0),
        ];
        let report = SegmentValidator::default().validate(&candidates, 100.0).unwrap();
        assert_eq!(report.segments.len(), 1);
        assert_eq!(report.segments[0].title(), "second pick");
    }

    #[test]
    fn test_empty_candidates_is_ok() {
        let report = SegmentValidator::default().validate(&[], 100.0).unwrap();
        assert!(report.segments.is_empty());
        assert_eq!(report.rejected_total(), 0);
    }

    #[test]
    fn test_invalid_duration() {
        let candidates = vec![CandidateMoment::new(0, "a", 0.0, 10.0)];
        let validator = SegmentValidator::default();
        assert_eq!(
            validator.validate(&candidates, 0.0),
            Err(ValidationError::InvalidDuration(0.0))
        );
        assert!(matches!(
            validator.validate(&candidates, f64::INFINITY),
            Err(ValidationError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_all_rejected() {
        let candidates = vec![
            CandidateMoment::new(0, "a", 5.0, 5.0),
            CandidateMoment::new(1, "b", 200.0, 210.0),
        ];
        let result = SegmentValidator::default().validate(&candidates, 100.0);
        match result {
            Err(ValidationError::AllRejected { total, rejections }) => {
                assert_eq!(total, 2);
                assert_eq!(rejections.len(), 2);
            }
            other => panic!("expected AllRejected, got {other:?}"),
        }
    }

    #[test]
    fn test_randomized_output_shape() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let duration: f64 = rng.random_range(1.0..600.0);
            let min: f64 = rng.random_range(0.0..10.0);
            let count = rng.random_range(0..25);
            let candidates: Vec<CandidateMoment> = (0..count)
                .map(|rank| {
                    let start: f64 = rng.random_range(-20.0..700.0);
                    let end: f64 = start + rng.random_range(-5.0..90.0);
                    CandidateMoment::new(rank, format!("m{rank}"), start, end)
                })
                .collect();

            let report = match SegmentValidator::new(min).validate(&candidates, duration) {
                Ok(report) => report,
                Err(ValidationError::AllRejected { total, rejections }) => {
                    assert_eq!(total, count);
                    assert_eq!(rejections.len(), count);
                    continue;
                }
                Err(other) => panic!("unexpected error {other:?}"),
            };

            assert_eq!(report.segments.len() + report.rejected_total(), count);
            assert!(check_segment_set(&report.segments, Some(duration), min).is_ok());
            for segment in &report.segments {
                assert!(segment.start_time() >= 0.0);
                assert!(segment.start_time() < segment.end_time());
                assert!(segment.end_time() <= duration);
                assert!(segment.duration() >= min);
            }
            for pair in report.segments.windows(2) {
                assert!(pair[0].start_time() <= pair[1].start_time());
                assert!(pair[0].end_time() <= pair[1].start_time());
            }
        }
    }

    #[test]
    fn test_deserialize_rejects_reversed_segment() {
        let json = r#"{"id":0,"start_time":9.0,"end_time":3.0,"title":"x","rationale":""}"#;
        assert!(serde_json::from_str::<ValidatedSegment>(json).is_err());
    }

    #[test]
    fn test_check_segment_set_rejects_gaps_in_ids() {
        let candidates = vec![
            CandidateMoment::new(0, "a", 0.0, 10.0),
            CandidateMoment::new(1, "b", 20.0, 30.0),
        ];
        let report = SegmentValidator::default().validate(&candidates, 100.0).unwrap();
        let reversed: Vec<ValidatedSegment> = report.segments.into_iter().rev().collect();
        assert!(check_segment_set(&reversed, None, 0.0).is_err());
    }

    #[test]
    fn test_check_segment_set_enforces_minimum() {
        let candidates = vec![
            CandidateMoment::new(0, "a", 0.0, 10.0),
            CandidateMoment::new(1, "b", 50.0, 52.0),
        ];
        let report = SegmentValidator::new(2.0).validate(&candidates, 100.0).unwrap();
        assert!(check_segment_set(&report.segments, Some(100.0), 2.0).is_ok());
        assert!(matches!(
            check_segment_set(&report.segments, Some(100.0), 3.0),
            Err(ValidationError::InvalidSegment(msg)) if msg.contains("below minimum")
        ));
    }
}
