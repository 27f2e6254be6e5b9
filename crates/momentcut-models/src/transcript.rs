//! Time-coded transcript model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timestamp::format_precise;

/// A single line of speech with its time range in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSpan {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl TranscriptSpan {
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Where the span timings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingSource {
    /// Timings were present in the source document.
    #[default]
    Native,
    /// Timings were estimated from the text alone.
    Synthesized,
}

/// Transcript errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranscriptError {
    #[error("transcript contains no text")]
    Empty,

    #[error("span {index} has invalid timing ({start}..{end})")]
    InvalidSpan { index: usize, start: f64, end: f64 },

    #[error("span {index} starts at {start} before the previous span ends at {previous_end}")]
    OutOfOrder {
        index: usize,
        start: f64,
        previous_end: f64,
    },

    #[error("media duration must be positive and finite, got {0}")]
    InvalidDuration(f64),

    #[error("failed to parse transcript: {0}")]
    Parse(String),
}

/// An ordered, non-overlapping sequence of spans covering `[0, duration]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    spans: Vec<TranscriptSpan>,
    duration: f64,
    timing: TimingSource,
}

impl Transcript {
    /// Build a transcript from already ordered spans.
    ///
    /// When `media_duration` is known it becomes the transcript duration and
    /// spans are clipped to it; otherwise the duration is the end of the last
    /// span.
    pub fn new(
        spans: Vec<TranscriptSpan>,
        media_duration: Option<f64>,
        timing: TimingSource,
    ) -> Result<Self, TranscriptError> {
        if let Some(duration) = media_duration {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(TranscriptError::InvalidDuration(duration));
            }
        }

        let mut previous_end = 0.0;
        for (index, span) in spans.iter().enumerate() {
            let valid = span.start_time.is_finite()
                && span.end_time.is_finite()
                && span.start_time >= 0.0
                && span.start_time < span.end_time;
            if !valid {
                return Err(TranscriptError::InvalidSpan {
                    index,
                    start: span.start_time,
                    end: span.end_time,
                });
            }
            if span.start_time < previous_end {
                return Err(TranscriptError::OutOfOrder {
                    index,
                    start: span.start_time,
                    previous_end,
                });
            }
            previous_end = span.end_time;
        }

        let spans: Vec<TranscriptSpan> = match media_duration {
            Some(limit) => spans
                .into_iter()
                .filter(|span| span.start_time < limit)
                .map(|mut span| {
                    span.end_time = span.end_time.min(limit);
                    span
                })
                .collect(),
            None => spans,
        };

        if spans.iter().all(|span| span.text.trim().is_empty()) {
            return Err(TranscriptError::Empty);
        }

        let duration = media_duration.unwrap_or(previous_end);
        Ok(Self {
            spans,
            duration,
            timing,
        })
    }

    pub fn spans(&self) -> &[TranscriptSpan] {
        &self.spans
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn timing(&self) -> TimingSource {
        self.timing
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Plain text of the whole transcript, one span per line.
    pub fn plain_text(&self) -> String {
        self.spans
            .iter()
            .map(|span| span.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Transcript rendered for an AI prompt, one timed span per line:
    /// `[00:00:04.230 - 00:00:21.900] text`.
    pub fn to_prompt_text(&self) -> String {
        self.spans
            .iter()
            .map(|span| {
                format!(
                    "[{} - {}] {}",
                    format_precise(span.start_time),
                    format_precise(span.end_time),
                    span.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Put loosely parsed spans into transcript shape.
///
/// Drops spans with empty text or unusable timing, sorts by start time and
/// truncates any span that runs into its successor. Spans left with no length
/// after truncation are dropped.
pub fn normalize_spans(spans: Vec<TranscriptSpan>) -> Vec<TranscriptSpan> {
    let mut spans: Vec<TranscriptSpan> = spans
        .into_iter()
        .map(|mut span| {
            span.text = span.text.trim().to_string();
            span
        })
        .filter(|span| {
            !span.text.is_empty()
                && span.start_time.is_finite()
                && span.end_time.is_finite()
                && span.start_time >= 0.0
                && span.start_time < span.end_time
        })
        .collect();

    spans.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut normalized: Vec<TranscriptSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = normalized.last_mut() {
            if span.start_time < last.end_time {
                last.end_time = span.start_time;
                if last.end_time <= last.start_time {
                    normalized.pop();
                }
            }
        }
        normalized.push(span);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_last_span() {
        let transcript = Transcript::new(
            vec![
                TranscriptSpan::new("hello", 0.0, 2.0),
                TranscriptSpan::new("world", 2.0, 5.5),
            ],
            None,
            TimingSource::Native,
        )
        .unwrap();
        assert_eq!(transcript.duration(), 5.5);
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_media_duration_clips_spans() {
        let transcript = Transcript::new(
            vec![
                TranscriptSpan::new("a", 0.0, 4.0),
                TranscriptSpan::new("b", 4.0, 12.0),
                TranscriptSpan::new("c", 12.0, 15.0),
            ],
            Some(10.0),
            TimingSource::Native,
        )
        .unwrap();
        assert_eq!(transcript.duration(), 10.0);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.spans()[1].end_time, 10.0);
    }

    #[test]
    fn test_rejects_overlap_and_bad_spans() {
        let overlap = Transcript::new(
            vec![
                TranscriptSpan::new("a", 0.0, 4.0),
                TranscriptSpan::new("b", 3.0, 6.0),
            ],
            None,
            TimingSource::Native,
        );
        assert!(matches!(overlap, Err(TranscriptError::OutOfOrder { index: 1, .. })));

        let reversed = Transcript::new(
            vec![TranscriptSpan::new("a", 4.0, 1.0)],
            None,
            TimingSource::Native,
        );
        assert!(matches!(reversed, Err(TranscriptError::InvalidSpan { index: 0, .. })));
    }

    #[test]
    fn test_rejects_empty() {
        let result = Transcript::new(Vec::new(), Some(30.0), TimingSource::Native);
        assert_eq!(result, Err(TranscriptError::Empty));
    }

    #[test]
    fn test_prompt_text_format() {
        let transcript = Transcript::new(
            vec![TranscriptSpan::new("Big news", 4.23, 21.9)],
            None,
            TimingSource::Native,
        )
        .unwrap();
        assert_eq!(
            transcript.to_prompt_text(),
            "[00:00:04.230 - 00:00:21.900] Big news"
        );
    }

    #[test]
    fn test_normalize_spans() {
        let spans = normalize_spans(vec![
            TranscriptSpan::new("second", 5.0, 9.0),
            TranscriptSpan::new("first", 0.0, 6.0),
            TranscriptSpan::new("   ", 9.0, 10.0),
            TranscriptSpan::new("dup", 5.0, 7.0),
            TranscriptSpan::new("bad", 3.0, 3.0),
        ]);
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "dup"]);
        assert_eq!(spans[0].end_time, 5.0);
    }
}
