//! Cut sheet construction.
//!
//! Production notes are derived from the segment alone, so the same segments
//! always produce the same cut sheet.

use momentcut_models::{
    format_precise, CutSheet, CutSheetEntry, ProductionNotes, ValidatedSegment, ValidationError,
};

/// Words kept for the opening hook subtitle.
const HOOK_WORDS: usize = 8;
/// Words kept for the thumbnail text.
const THUMBNAIL_WORDS: usize = 4;

/// Builds cut sheets from validated segments.
#[derive(Debug, Clone, PartialEq)]
pub struct CutSheetBuilder {
    aspect_ratio: String,
}

impl Default for CutSheetBuilder {
    fn default() -> Self {
        Self {
            aspect_ratio: "9:16".to_string(),
        }
    }
}

impl CutSheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    /// Pair every segment with its notes. Fails if the segments are not a
    /// valid ordered set within `media_duration`.
    pub fn build(
        &self,
        segments: &[ValidatedSegment],
        media_duration: f64,
    ) -> Result<CutSheet, ValidationError> {
        let entries = segments
            .iter()
            .map(|segment| CutSheetEntry::new(segment.clone(), self.notes_for(segment)))
            .collect();
        CutSheet::new(media_duration, entries)
    }

    /// Production notes for one segment.
    pub fn notes_for(&self, segment: &ValidatedSegment) -> ProductionNotes {
        let duration = segment.duration();
        ProductionNotes {
            clip_label: clip_label(segment),
            in_point: format_precise(segment.start_time()),
            out_point: format_precise(segment.end_time()),
            duration_secs: (duration * 1000.0).round() / 1000.0,
            aspect_ratio: self.aspect_ratio.clone(),
            crop_note: crop_note(duration).to_string(),
            pacing_note: pacing_note(duration).to_string(),
            opening_hook_subtitle: hook_subtitle(segment),
            thumbnail_text: thumbnail_text(segment.title()),
            platform_priority: platform_priority(duration)
                .iter()
                .map(|p| p.to_string())
                .collect(),
            caption: caption(segment),
        }
    }
}

/// `UPPER_SNAKE_CASE` of the title, or `CLIP_{id}` for titles with no usable
/// characters.
fn clip_label(segment: &ValidatedSegment) -> String {
    let label = segment
        .title()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("_");
    if label.is_empty() {
        format!("CLIP_{:03}", segment.id())
    } else {
        label
    }
}

fn crop_note(duration: f64) -> &'static str {
    if duration <= 20.0 {
        "tight on face, punch in on the hook line"
    } else if duration <= 45.0 {
        "medium shot, one punch-in at the turn"
    } else {
        "medium shot, alternate wide and close every 8 to 10 seconds"
    }
}

fn pacing_note(duration: f64) -> &'static str {
    if duration <= 20.0 {
        "fast, no pauses"
    } else if duration <= 45.0 {
        "trim any filler before the hook"
    } else {
        "trim pauses over half a second, let the last line breathe"
    }
}

fn platform_priority(duration: f64) -> &'static [&'static str] {
    if duration <= 30.0 {
        &["TikTok", "Reels", "YouTube Shorts"]
    } else if duration <= 60.0 {
        &["YouTube Shorts", "Reels", "TikTok"]
    } else {
        &["YouTube", "LinkedIn"]
    }
}

fn first_words(text: &str, count: usize) -> (String, bool) {
    let words: Vec<&str> = text.split_whitespace().collect();
    let truncated = words.len() > count;
    (words[..words.len().min(count)].join(" "), truncated)
}

fn hook_subtitle(segment: &ValidatedSegment) -> String {
    let source = segment
        .quote()
        .filter(|q| !q.trim().is_empty())
        .unwrap_or(segment.title());
    let (words, truncated) = first_words(source, HOOK_WORDS);
    if truncated {
        format!("{words}...")
    } else {
        words
    }
}

fn thumbnail_text(title: &str) -> String {
    first_words(title, THUMBNAIL_WORDS).0.to_uppercase()
}

fn caption(segment: &ValidatedSegment) -> String {
    if let Some(caption) = segment.caption().filter(|c| !c.trim().is_empty()) {
        return caption.trim().to_string();
    }
    let tag: String = segment
        .hook_category()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if tag.is_empty() {
        segment.title().to_string()
    } else {
        format!("{} #{}", segment.title(), tag)
    }
}
