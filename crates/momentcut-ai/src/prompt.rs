//! Prompt construction.

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use momentcut_models::Transcript;

/// Response envelope the model is asked to produce.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MomentsEnvelope {
    /// Moments ordered strongest first.
    pub moments: Vec<MomentSchema>,
}

/// One moment as described to the model.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MomentSchema {
    /// Short, punchy clip title.
    pub title: String,
    /// Clip start in seconds from the beginning of the video.
    pub start_time: f64,
    /// Clip end in seconds from the beginning of the video.
    pub end_time: f64,
    /// One sharp sentence on why this moment travels.
    pub rationale: String,
    /// Estimated virality from 0.0 to 1.0.
    pub virality_score: Option<f64>,
    /// Exact transcript words spoken in the clip.
    pub quote: Option<String>,
    /// Hook type, e.g. "shock", "humor", "controversy", "relatable", "awe".
    pub hook_category: Option<String>,
    /// Social caption with hashtags.
    pub caption: Option<String>,
}

/// JSON schema of [`MomentsEnvelope`], pretty-printed.
pub fn response_schema() -> String {
    let schema = schema_for!(MomentsEnvelope);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// Build the extraction prompt for `transcript`.
pub fn build_prompt(transcript: &Transcript, target_count: usize, min_clip_length: f64) -> String {
    format!(
        r#"You are a short-form video editor. Find the strongest viral moments in the transcript below: lines that would stop a scroll on TikTok, Reels or Shorts.

Rules:
- Return at most {target_count} moments, strongest first.
- Each moment must open with a hook in its first seconds and end on its punch line.
- Each moment must be at least {min_clip_length:.0} seconds long; aim for 15 to 60 seconds.
- Moments must not overlap.
- Use times from the transcript. start_time and end_time are seconds from the start of the video (the transcript shows them as HH:MM:SS.mmm).
- The transcript runs for {duration:.3} seconds; never return times past that.
- quote must be copied exactly from the transcript. Never invent or paraphrase.
- If nothing is usable, return {{"moments": []}}.

Return ONLY a JSON object matching this schema, with no prose and no code fences:
{schema}

TRANSCRIPT:
{text}
"#,
        duration = transcript.duration(),
        schema = response_schema(),
        text = transcript.to_prompt_text(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use momentcut_models::{TimingSource, TranscriptSpan};

    #[test]
    fn test_prompt_embeds_transcript_and_limits() {
        let transcript = Transcript::new(
            vec![TranscriptSpan::new("This changes everything.", 4.23, 21.9)],
            Some(60.0),
            TimingSource::Native,
        )
        .unwrap();
        let prompt = build_prompt(&transcript, 5, 3.0);
        assert!(prompt.contains("at most 5 moments"));
        assert!(prompt.contains("at least 3 seconds"));
        assert!(prompt.contains("[00:00:04.230 - 00:00:21.900] This changes everything."));
        assert!(prompt.contains("60.000 seconds"));
        assert!(prompt.contains("\"virality_score\""));
    }

    #[test]
    fn test_schema_lists_required_fields() {
        let schema: serde_json::Value = serde_json::from_str(&response_schema()).unwrap();
        let required = schema["definitions"]["MomentSchema"]["required"]
            .as_array()
            .unwrap();
        for field in ["title", "start_time", "end_time", "rationale"] {
            assert!(required.iter().any(|v| v == field), "{field} should be required");
        }
    }
}
