//! Cut sheet: validated segments paired with production notes.

use serde::{Deserialize, Serialize};

use crate::segment::{check_segment_set, ValidatedSegment, ValidationError};

/// Editing guidance derived from a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionNotes {
    /// UPPER_SNAKE_CASE label for timelines and file browsers.
    pub clip_label: String,
    /// `HH:MM:SS.mmm`
    pub in_point: String,
    /// `HH:MM:SS.mmm`
    pub out_point: String,
    pub duration_secs: f64,
    pub aspect_ratio: String,
    pub crop_note: String,
    pub pacing_note: String,
    pub opening_hook_subtitle: String,
    pub thumbnail_text: String,
    pub platform_priority: Vec<String>,
    pub caption: String,
}

/// One validated segment with its notes. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutSheetEntry {
    segment: ValidatedSegment,
    notes: ProductionNotes,
}

impl CutSheetEntry {
    pub fn new(segment: ValidatedSegment, notes: ProductionNotes) -> Self {
        Self { segment, notes }
    }

    pub fn segment(&self) -> &ValidatedSegment {
        &self.segment
    }

    pub fn notes(&self) -> &ProductionNotes {
        &self.notes
    }
}

/// Ordered cut sheet for one media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CutSheetFields")]
pub struct CutSheet {
    media_duration: f64,
    entries: Vec<CutSheetEntry>,
}

#[derive(Deserialize)]
struct CutSheetFields {
    media_duration: f64,
    entries: Vec<CutSheetEntry>,
}

impl TryFrom<CutSheetFields> for CutSheet {
    type Error = ValidationError;

    fn try_from(fields: CutSheetFields) -> Result<Self, Self::Error> {
        Self::new(fields.media_duration, fields.entries)
    }
}

impl CutSheet {
    /// Build a cut sheet, re-checking segment order against `media_duration`.
    pub fn new(media_duration: f64, entries: Vec<CutSheetEntry>) -> Result<Self, ValidationError> {
        if !media_duration.is_finite() || media_duration <= 0.0 {
            return Err(ValidationError::InvalidDuration(media_duration));
        }
        let segments: Vec<ValidatedSegment> =
            entries.iter().map(|entry| entry.segment.clone()).collect();
        check_segment_set(&segments, Some(media_duration), 0.0)?;
        Ok(Self {
            media_duration,
            entries,
        })
    }

    pub fn media_duration(&self) -> f64 {
        self.media_duration
    }

    pub fn entries(&self) -> &[CutSheetEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn segments(&self) -> Vec<ValidatedSegment> {
        self.entries.iter().map(|entry| entry.segment.clone()).collect()
    }

    /// One-line summary: `Generated 3 viral clips • Hooks: humor ×2, shock ×1`.
    pub fn summary(&self) -> String {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for entry in &self.entries {
            let Some(hook) = entry.segment.hook_category() else {
                continue;
            };
            let hook = hook.trim().to_lowercase();
            if hook.is_empty() {
                continue;
            }
            match counts.iter_mut().find(|(name, _)| *name == hook) {
                Some((_, count)) => *count += 1,
                None => counts.push((hook, 1)),
            }
        }

        let noun = if self.entries.len() == 1 { "clip" } else { "clips" };
        let mut summary = format!("Generated {} viral {}", self.entries.len(), noun);
        if !counts.is_empty() {
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            let hooks: Vec<String> = counts
                .iter()
                .map(|(name, count)| format!("{name} ×{count}"))
                .collect();
            summary.push_str(" • Hooks: ");
            summary.push_str(&hooks.join(", "));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moment::CandidateMoment;
    use crate::segment::SegmentValidator;

    fn notes(label: &str) -> ProductionNotes {
        ProductionNotes {
            clip_label: label.to_string(),
            in_point: String::new(),
            out_point: String::new(),
            duration_secs: 0.0,
            aspect_ratio: "9:16".to_string(),
            crop_note: String::new(),
            pacing_note: String::new(),
            opening_hook_subtitle: String::new(),
            thumbnail_text: String::new(),
            platform_priority: Vec::new(),
            caption: String::new(),
        }
    }

    fn sheet() -> CutSheet {
        let mut a = CandidateMoment::new(0, "a", 0.0, 10.0);
        a.hook_category = Some("Humor".into());
        let mut b = CandidateMoment::new(1, "b", 20.0, 30.0);
        b.hook_category = Some("humor".into());
        let mut c = CandidateMoment::new(2, "c", 40.0, 50.0);
        c.hook_category = Some("shock".into());
        let report = SegmentValidator::default().validate(&[a, b, c], 60.0).unwrap();
        let entries = report
            .segments
            .into_iter()
            .map(|segment| CutSheetEntry::new(segment, notes("X")))
            .collect();
        CutSheet::new(60.0, entries).unwrap()
    }

    #[test]
    fn test_summary_counts_hooks() {
        assert_eq!(
            sheet().summary(),
            "Generated 3 viral clips • Hooks: humor ×2, shock ×1"
        );
    }

    #[test]
    fn test_json_reload_checks_duration() {
        let json = serde_json::to_string(&sheet()).unwrap();
        let reloaded: CutSheet = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, sheet());

        let shrunk = json.replace("\"media_duration\":60.0", "\"media_duration\":45.0");
        assert!(serde_json::from_str::<CutSheet>(&shrunk).is_err());
    }

    #[test]
    fn test_empty_sheet_summary() {
        let empty = CutSheet::new(10.0, Vec::new()).unwrap();
        assert_eq!(empty.summary(), "Generated 0 viral clips");
    }
}
