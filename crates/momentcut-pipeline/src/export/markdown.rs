//! Markdown export.

use momentcut_models::{format_hms, CutSheet};

/// Headings per clip, timestamps as `HH:MM:SS`.
pub fn to_markdown(sheet: &CutSheet) -> String {
    if sheet.is_empty() {
        return "# Viral Clips\n\nNo clips found.\n".to_string();
    }

    let mut lines = vec![
        "# Viral Clips".to_string(),
        String::new(),
        sheet.summary(),
        String::new(),
    ];

    for entry in sheet.entries() {
        let segment = entry.segment();
        let notes = entry.notes();

        lines.push(format!(
            "## Clip {} – {}",
            segment.id() + 1,
            notes.clip_label
        ));
        lines.push(String::new());
        lines.push(format!("- **Title:** {}", segment.title()));
        lines.push(format!(
            "- **Timestamps:** {} – {}",
            format_hms(segment.start_time()),
            format_hms(segment.end_time())
        ));
        lines.push(format!("- **Duration:** {:.1} seconds", notes.duration_secs));
        if let Some(hook) = segment.hook_category() {
            lines.push(format!("- **Hook:** {hook}"));
        }
        if let Some(score) = segment.virality_score() {
            lines.push(format!("- **Virality:** {score:.2}"));
        }
        lines.push(String::new());

        if let Some(quote) = segment.quote() {
            lines.push("**Quote:**".to_string());
            lines.extend(quote.lines().map(|l| format!("> {l}")));
            lines.push(String::new());
        }
        if !segment.rationale().is_empty() {
            lines.push("**Why it hits:**".to_string());
            lines.extend(segment.rationale().lines().map(|l| format!("> {l}")));
            lines.push(String::new());
        }

        lines.push("**Editor Cut Sheet:**".to_string());
        lines.push(format!("- **In Point:** {}", notes.in_point));
        lines.push(format!("- **Out Point:** {}", notes.out_point));
        lines.push(format!("- **Aspect Ratio:** {}", notes.aspect_ratio));
        lines.push(format!("- **Crop Note:** {}", notes.crop_note));
        lines.push(format!("- **Pacing Note:** {}", notes.pacing_note));
        lines.push(format!(
            "- **Opening Hook Subtitle:** {}",
            notes.opening_hook_subtitle
        ));
        lines.push(format!("- **Thumbnail Text:** {}", notes.thumbnail_text));
        lines.push(format!(
            "- **Platform Priority:** {}",
            notes.platform_priority.join(" / ")
        ));
        lines.push(format!("- **Caption:** {}", notes.caption));
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutsheet::CutSheetBuilder;
    use momentcut_models::{CandidateMoment, SegmentValidator};

    #[test]
    fn test_empty_sheet() {
        let sheet = CutSheet::new(60.0, Vec::new()).unwrap();
        assert_eq!(to_markdown(&sheet), "# Viral Clips\n\nNo clips found.\n");
    }

    #[test]
    fn test_clip_sections() {
        let mut first = CandidateMoment::new(0, "Cold open", 4.9, 61.2).with_rationale("Opens on a dare");
        first.quote = Some("I bet you won't".into());
        first.hook_category = Some("humor".into());
        let second = CandidateMoment::new(1, "The turn", 3700.0, 3725.0);
        let segments = SegmentValidator::default()
            .validate(&[first, second], 4000.0)
            .unwrap()
            .segments;
        let sheet = CutSheetBuilder::new().build(&segments, 4000.0).unwrap();
        let md = to_markdown(&sheet);

        assert!(md.contains("Generated 2 viral clips • Hooks: humor ×1"));
        assert!(md.contains("## Clip 1 – COLD_OPEN"));
        assert!(md.contains("- **Timestamps:** 00:00:04 – 00:01:01"));
        assert!(md.contains("> I bet you won't"));
        assert!(md.contains("> Opens on a dare"));
        assert!(md.contains("## Clip 2 – THE_TURN"));
        assert!(md.contains("- **Timestamps:** 01:01:40 – 01:02:05"));
    }
}
