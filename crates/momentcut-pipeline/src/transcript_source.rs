//! Transcript loading.
//!
//! Detects the transcript format (JSON spans, WebVTT, SRT, bracketed
//! timestamp lines or plain text) and turns it into a [`Transcript`]. Plain
//! text has no timing, so spans are synthesized per sentence at a fixed
//! speaking rate.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use momentcut_models::{
    normalize_spans, parse_timestamp, TimingSource, Transcript, TranscriptError, TranscriptSpan,
};

use crate::error::PipelineResult;

/// Speaking rate used to synthesize timing.
pub const WORDS_PER_SECOND: f64 = 2.6;

/// Shortest synthesized span.
pub const MIN_SPAN_SECS: f64 = 1.0;

const JSON_LIST_KEYS: &[&str] = &["transcript", "segments", "spans"];

fn cue_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*((?:\d+:)?\d{1,2}:\d{2}(?:[.,]\d{1,3})?)\s*-->\s*((?:\d+:)?\d{1,2}:\d{2}(?:[.,]\d{1,3})?)")
            .expect("static regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex"))
}

fn bracket_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[\s*(\d[\d:.,]*)\s*(?:–|—|-|to)\s*(\d[\d:.,]*)\s*\]\s*(.*)$")
            .expect("static regex")
    })
}

fn bracket_start_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[\s*(\d[\d:.,]*)\s*\]\s*(.*)$").expect("static regex"))
}

/// Recognized transcript layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    /// A list of `{text, start, end}` objects, bare or under `transcript`.
    Json,
    WebVtt,
    Srt,
    /// `[MM:SS.xx–MM:SS.xx] text` or `[HH:MM:SS] text` lines.
    Bracketed,
    /// No timing at all.
    PlainText,
}

/// A span whose end may only be known from its successor.
#[derive(Debug, Clone)]
struct OpenSpan {
    text: String,
    start: f64,
    end: Option<f64>,
}

/// Raw transcript text and its detected format.
#[derive(Debug, Clone)]
pub struct TranscriptSource {
    raw: String,
    format: TranscriptFormat,
}

impl TranscriptSource {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let raw = raw.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(raw);
        let format = detect_format(&raw);
        Self { raw, format }
    }

    /// Read a transcript file.
    pub async fn from_path(path: &Path) -> PipelineResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let source = Self::new(raw);
        debug!(path = %path.display(), format = ?source.format, "Loaded transcript");
        Ok(source)
    }

    /// Parse `text` in one step.
    pub fn parse(text: &str, media_duration: Option<f64>) -> Result<Transcript, TranscriptError> {
        Self::new(text).transcript(media_duration)
    }

    pub fn format(&self) -> TranscriptFormat {
        self.format
    }

    /// Build the transcript. A known `media_duration` bounds the spans and
    /// becomes the transcript duration.
    pub fn transcript(&self, media_duration: Option<f64>) -> Result<Transcript, TranscriptError> {
        let (spans, timing) = match self.format {
            TranscriptFormat::Json => (
                close_spans(parse_json(&self.raw)?, media_duration),
                TimingSource::Native,
            ),
            TranscriptFormat::WebVtt | TranscriptFormat::Srt => (
                close_spans(parse_cues(&self.raw)?, media_duration),
                TimingSource::Native,
            ),
            TranscriptFormat::Bracketed => (
                close_spans(parse_bracketed(&self.raw)?, media_duration),
                TimingSource::Native,
            ),
            TranscriptFormat::PlainText => (
                synthesize_timing(&self.raw, media_duration),
                TimingSource::Synthesized,
            ),
        };

        let spans = normalize_spans(spans);
        debug!(format = ?self.format, spans = spans.len(), "Parsed transcript");
        Transcript::new(spans, media_duration, timing)
    }
}

fn detect_format(text: &str) -> TranscriptFormat {
    let trimmed = text.trim_start();
    if trimmed.starts_with("WEBVTT") {
        return TranscriptFormat::WebVtt;
    }
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<Value>(trimmed).is_ok()
    {
        return TranscriptFormat::Json;
    }
    if let Some(caps) = text.lines().find_map(|line| cue_regex().captures(line)) {
        return if caps[1].contains(',') {
            TranscriptFormat::Srt
        } else {
            TranscriptFormat::WebVtt
        };
    }
    let bracketed = text.lines().map(str::trim).any(|line| {
        bracket_range_regex().is_match(line) || bracket_start_regex().is_match(line)
    });
    if bracketed {
        TranscriptFormat::Bracketed
    } else {
        TranscriptFormat::PlainText
    }
}

fn timestamp(raw: &str, line: usize) -> Result<f64, TranscriptError> {
    parse_timestamp(raw.trim())
        .map_err(|e| TranscriptError::Parse(format!("line {}: {}", line + 1, e)))
}

fn speaking_time(text: &str) -> f64 {
    let words = text.split_whitespace().count() as f64;
    (words / WORDS_PER_SECOND).max(MIN_SPAN_SECS)
}

/// Fill missing ends from the next span's start; the last open span runs to
/// the media end, or for as long as it takes to say.
fn close_spans(mut spans: Vec<OpenSpan>, media_duration: Option<f64>) -> Vec<TranscriptSpan> {
    spans.sort_by(|a, b| a.start.total_cmp(&b.start));
    spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let end = span
                .end
                .or_else(|| {
                    spans
                        .get(i + 1)
                        .map(|next| next.start)
                        .filter(|next| *next > span.start)
                })
                .unwrap_or_else(|| match media_duration {
                    Some(duration) if duration > span.start => duration,
                    _ => span.start + speaking_time(&span.text),
                });
            TranscriptSpan::new(span.text.clone(), span.start, end)
        })
        .collect()
}

fn json_time(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_timestamp(s.trim()).ok(),
        _ => None,
    }
}

fn json_field(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| map.get(*k)).find_map(json_time)
}

fn parse_json(text: &str) -> Result<Vec<OpenSpan>, TranscriptError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| TranscriptError::Parse(format!("invalid JSON transcript: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => JSON_LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| TranscriptError::Parse("JSON transcript has no span list".to_string()))?,
        _ => {
            return Err(TranscriptError::Parse(
                "JSON transcript must be a list or an object".to_string(),
            ))
        }
    };

    let mut spans = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(map) = item.as_object() else {
            debug!(index, "Skipping non-object transcript entry");
            continue;
        };
        let text = map
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let Some(start) = json_field(map, &["start", "start_time", "offset"]) else {
            debug!(index, "Skipping transcript entry without a start time");
            continue;
        };
        let end = json_field(map, &["end", "end_time"]).or_else(|| {
            json_field(map, &["duration", "dur"]).map(|duration| start + duration)
        });
        spans.push(OpenSpan { text, start, end });
    }
    Ok(spans)
}

/// WebVTT and SRT cues. Inline tags are stripped and lines repeated from the
/// previous cue (rolling captions) are dropped.
fn parse_cues(text: &str) -> Result<Vec<OpenSpan>, TranscriptError> {
    let mut spans: Vec<OpenSpan> = Vec::new();
    let mut previous_lines: Vec<String> = Vec::new();
    let mut current: Option<(f64, f64, Vec<String>)> = None;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if let Some(caps) = cue_regex().captures(line) {
            flush_cue(&mut spans, &mut previous_lines, current.take());
            let start = timestamp(&caps[1], number)?;
            let end = timestamp(&caps[2], number)?;
            current = Some((start, end, Vec::new()));
            continue;
        }
        if line.is_empty() {
            flush_cue(&mut spans, &mut previous_lines, current.take());
            continue;
        }
        if let Some((_, _, lines)) = current.as_mut() {
            let clean = tag_regex().replace_all(line, "");
            let clean = clean.trim();
            if !clean.is_empty() {
                lines.push(clean.to_string());
            }
        }
    }
    flush_cue(&mut spans, &mut previous_lines, current.take());
    Ok(spans)
}

fn flush_cue(
    spans: &mut Vec<OpenSpan>,
    previous_lines: &mut Vec<String>,
    cue: Option<(f64, f64, Vec<String>)>,
) {
    let Some((start, end, lines)) = cue else {
        return;
    };
    if lines.is_empty() {
        return;
    }

    let fresh: Vec<&str> = lines
        .iter()
        .filter(|line| !previous_lines.contains(line))
        .map(String::as_str)
        .collect();

    if fresh.is_empty() {
        if let Some(last) = spans.last_mut() {
            last.end = Some(last.end.map_or(end, |e| e.max(end)));
        }
    } else {
        spans.push(OpenSpan {
            text: fresh.join(" "),
            start,
            end: Some(end),
        });
    }
    *previous_lines = lines;
}

fn parse_bracketed(text: &str) -> Result<Vec<OpenSpan>, TranscriptError> {
    let mut spans: Vec<OpenSpan> = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = bracket_range_regex().captures(line) {
            spans.push(OpenSpan {
                text: caps[3].trim().to_string(),
                start: timestamp(&caps[1], number)?,
                end: Some(timestamp(&caps[2], number)?),
            });
        } else if let Some(caps) = bracket_start_regex().captures(line) {
            spans.push(OpenSpan {
                text: caps[2].trim().to_string(),
                start: timestamp(&caps[1], number)?,
                end: None,
            });
        } else if let Some(last) = spans.last_mut() {
            // Continuation of the previous timed line.
            if !last.text.is_empty() {
                last.text.push(' ');
            }
            last.text.push_str(line);
        }
    }
    Ok(spans)
}

/// Split text into sentences on `.`, `!` or `?` followed by whitespace, and
/// at line breaks.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut chars = paragraph.chars().peekable();
        while let Some(c) = chars.next() {
            current.push(c);
            let boundary = matches!(c, '.' | '!' | '?')
                && chars.peek().map_or(true, |next| next.is_whitespace());
            if boundary {
                push_sentence(&mut sentences, &mut current);
            }
        }
        push_sentence(&mut sentences, &mut current);
    }
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    current.clear();
}

/// One span per sentence, back to back. With a known media duration the
/// spans are stretched or squeezed to end exactly at the media end.
fn synthesize_timing(text: &str, media_duration: Option<f64>) -> Vec<TranscriptSpan> {
    let mut clock = 0.0;
    let mut spans: Vec<TranscriptSpan> = split_sentences(text)
        .into_iter()
        .map(|sentence| {
            let start = clock;
            clock += speaking_time(&sentence);
            TranscriptSpan::new(sentence, start, clock)
        })
        .collect();

    if let Some(duration) = media_duration.filter(|d| d.is_finite() && *d > 0.0) {
        if clock > 0.0 {
            let scale = duration / clock;
            for span in &mut spans {
                span.start_time *= scale;
                span.end_time *= scale;
            }
            if let Some(last) = spans.last_mut() {
                last.end_time = duration;
            }
        }
    }
    spans
}
