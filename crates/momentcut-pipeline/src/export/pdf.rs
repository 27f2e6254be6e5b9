//! PDF export.
//!
//! Writes a small PDF 1.4 file by hand: US Letter pages, the standard
//! Helvetica faces at 10pt, one text line per row. Standard fonts need no
//! embedded font data, so the output stays plain ASCII.

use momentcut_models::{format_hms, CutSheet};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN_X: i64 = 40;
const TOP_Y: i64 = PAGE_HEIGHT - 50;
const BOTTOM_Y: i64 = 60;
const LINE_HEIGHT: i64 = 14;
const FONT_SIZE: i64 = 10;
const MAX_CHARS: usize = 110;

const LINES_PER_PAGE: usize = ((TOP_Y - BOTTOM_Y) / LINE_HEIGHT + 1) as usize;

struct Line {
    text: String,
    bold: bool,
}

impl Line {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

fn separator() -> Line {
    Line::plain("-".repeat(60))
}

fn document_lines(sheet: &CutSheet) -> Vec<Line> {
    let mut lines = vec![Line::bold("MomentCut - Viral Clips Cut Sheet"), Line::plain("")];

    if sheet.is_empty() {
        lines.push(Line::plain("No clips found."));
        return lines;
    }

    lines.push(Line::plain(sheet.summary()));
    lines.push(Line::plain(""));
    lines.push(separator());

    for entry in sheet.entries() {
        let segment = entry.segment();
        let notes = entry.notes();

        lines.push(Line::bold(format!(
            "Clip {}: {}",
            segment.id() + 1,
            notes.clip_label
        )));
        lines.push(Line::plain(format!("Title: {}", segment.title())));
        lines.push(Line::plain(format!(
            "Timestamps: {} - {}",
            format_hms(segment.start_time()),
            format_hms(segment.end_time())
        )));
        lines.push(Line::plain(format!("Duration: {:.1} s", notes.duration_secs)));
        if let Some(hook) = segment.hook_category() {
            lines.push(Line::plain(format!("Hook: {hook}")));
        }
        if !segment.rationale().is_empty() {
            lines.push(Line::plain("Why it hits:"));
            lines.extend(segment.rationale().lines().map(|l| Line::plain(format!("  {l}"))));
        }
        if let Some(quote) = segment.quote() {
            lines.push(Line::plain("Quote:"));
            lines.extend(quote.lines().map(|l| Line::plain(format!("  {l}"))));
        }

        lines.push(Line::plain("Cut sheet:"));
        lines.push(Line::plain(format!(
            "  In -> Out: {} -> {}",
            notes.in_point, notes.out_point
        )));
        lines.push(Line::plain(format!("  Aspect: {}", notes.aspect_ratio)));
        lines.push(Line::plain(format!("  Crop: {}", notes.crop_note)));
        lines.push(Line::plain(format!("  Pacing: {}", notes.pacing_note)));
        lines.push(Line::plain(format!("  Hook subtitle: {}", notes.opening_hook_subtitle)));
        lines.push(Line::plain(format!("  Thumbnail text: {}", notes.thumbnail_text)));
        lines.push(Line::plain(format!(
            "  Platform priority: {}",
            notes.platform_priority.join(" / ")
        )));
        lines.push(Line::plain(format!("  Caption: {}", notes.caption)));
        lines.push(separator());
    }
    lines
}

/// Map text onto printable ASCII, truncate long lines, escape string
/// delimiters.
fn pdf_string(text: &str) -> String {
    let mut ascii = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '–' | '—' => ascii.push('-'),
            '→' => ascii.push_str("->"),
            '×' => ascii.push('x'),
            '•' => ascii.push('*'),
            '‘' | '’' => ascii.push('\''),
            '“' | '”' => ascii.push('"'),
            c if c.is_ascii_graphic() || c == ' ' => ascii.push(c),
            c if c.is_whitespace() => ascii.push(' '),
            _ => ascii.push('?'),
        }
    }

    if ascii.len() > MAX_CHARS {
        ascii.truncate(MAX_CHARS - 3);
        ascii.push_str("...");
    }

    ascii
        .replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

fn page_content(lines: &[Line]) -> String {
    let mut content = String::new();
    let mut y = TOP_Y;
    for line in lines {
        if !line.text.is_empty() {
            let font = if line.bold { "F2" } else { "F1" };
            content.push_str(&format!(
                "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
                font,
                FONT_SIZE,
                MARGIN_X,
                y,
                pdf_string(&line.text)
            ));
        }
        y -= LINE_HEIGHT;
    }
    content
}

/// Render the cut sheet as PDF bytes.
pub fn to_pdf(sheet: &CutSheet) -> Vec<u8> {
    let lines = document_lines(sheet);
    let pages: Vec<&[Line]> = lines.chunks(LINES_PER_PAGE).collect();

    // Objects 1-4 are fixed; each page adds a page object and its content.
    let mut objects: Vec<String> = Vec::with_capacity(4 + pages.len() * 2);
    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 5 + i * 2))
        .collect();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );

    for (i, page) in pages.iter().enumerate() {
        let content_id = 6 + i * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH, PAGE_HEIGHT, content_id
        ));
        let content = page_content(page);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    out.into_bytes()
}
