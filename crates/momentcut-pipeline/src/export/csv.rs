//! CSV export.

use momentcut_models::CutSheet;

/// Core segment columns first, production columns after.
pub const COLUMNS: &[&str] = &[
    "id",
    "start_time",
    "end_time",
    "duration",
    "title",
    "rationale",
    "clip_label",
    "in_point",
    "out_point",
    "aspect_ratio",
    "crop_note",
    "pacing_note",
    "opening_hook_subtitle",
    "thumbnail_text",
    "platform_priority",
    "hook_category",
    "virality_score",
    "quote",
    "caption",
];

/// Quote a field when it holds a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row(out: &mut String, fields: &[String]) {
    let row: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// One header row, then one row per entry. Times are seconds with
/// millisecond precision.
pub fn to_csv(sheet: &CutSheet) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        &COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
    );

    for entry in sheet.entries() {
        let segment = entry.segment();
        let notes = entry.notes();
        push_row(
            &mut out,
            &[
                segment.id().to_string(),
                format!("{:.3}", segment.start_time()),
                format!("{:.3}", segment.end_time()),
                format!("{:.3}", segment.duration()),
                segment.title().to_string(),
                segment.rationale().to_string(),
                notes.clip_label.clone(),
                notes.in_point.clone(),
                notes.out_point.clone(),
                notes.aspect_ratio.clone(),
                notes.crop_note.clone(),
                notes.pacing_note.clone(),
                notes.opening_hook_subtitle.clone(),
                notes.thumbnail_text.clone(),
                notes.platform_priority.join("; "),
                segment.hook_category().unwrap_or_default().to_string(),
                segment
                    .virality_score()
                    .map(|s| format!("{s:.2}"))
                    .unwrap_or_default(),
                segment.quote().unwrap_or_default().to_string(),
                notes.caption.clone(),
            ],
        );
    }
    out
}
