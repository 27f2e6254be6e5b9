//! Lenient parsing of model output into candidate moments.
//!
//! Accepts the documented envelope plus the shapes models drift into:
//! code fences, prose around the JSON, a bare list, other envelope keys, a
//! single moment object, string timestamps, and a combined `timestamps`
//! range. Times that cannot be read are kept as [`MomentTime::Malformed`].

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use momentcut_models::{parse_timestamp, CandidateMoment, MomentTime};

use crate::error::{AiError, AiResult};

const ENVELOPE_KEYS: &[&str] = &["moments", "highlights", "clips", "segments"];
const START_KEYS: &[&str] = &["start_time", "start", "start_seconds"];
const END_KEYS: &[&str] = &["end_time", "end", "end_seconds"];
const TITLE_KEYS: &[&str] = &["title", "clip_label", "label"];
const RATIONALE_KEYS: &[&str] = &["rationale", "why_it_hits", "reason"];
const HOOK_KEYS: &[&str] = &["hook_category", "viral_trigger", "hook"];
const CAPTION_KEYS: &[&str] = &["caption", "description"];
const SCORE_KEYS: &[&str] = &["virality_score", "score"];

fn object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

fn array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("static regex"))
}

/// Parse raw model output into ranked candidates.
///
/// An explicit empty list parses to an empty vector; output with no
/// recognizable moment list is a parse error.
pub fn parse_moments(raw: &str) -> AiResult<Vec<CandidateMoment>> {
    let value = extract_json(raw)?;
    let items = moment_items(value)?;
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(rank, item)| candidate_from_value(rank, &item))
        .collect())
}

/// Strip code fences from model output.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let text = match text.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
            rest.strip_suffix("```").unwrap_or(rest)
        }
        None => text,
    };
    text.trim()
}

fn extract_json(raw: &str) -> AiResult<Value> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(AiError::parse("empty output"));
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    for re in [object_regex(), array_regex()] {
        if let Some(found) = re.find(text) {
            if let Ok(value) = serde_json::from_str::<Value>(found.as_str()) {
                return Ok(value);
            }
        }
    }

    let preview: String = text.chars().take(120).collect();
    Err(AiError::parse(format!("no JSON found in output: {preview}")))
}

fn moment_items(value: Value) -> AiResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                match map.remove(*key) {
                    Some(Value::Array(items)) => return Ok(items),
                    Some(Value::Null) | None => continue,
                    Some(other) => {
                        return Err(AiError::parse(format!(
                            "'{key}' should be a list, got {}",
                            type_name(&other)
                        )))
                    }
                }
            }
            if looks_like_moment(&map) {
                Ok(vec![Value::Object(map)])
            } else {
                Err(AiError::parse("JSON object has no moment list"))
            }
        }
        other => Err(AiError::parse(format!(
            "expected a JSON object or list, got {}",
            type_name(&other)
        ))),
    }
}

fn looks_like_moment(map: &Map<String, Value>) -> bool {
    map.contains_key("timestamps")
        || START_KEYS.iter().any(|k| map.contains_key(*k))
        || END_KEYS.iter().any(|k| map.contains_key(*k))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn candidate_from_value(rank: usize, item: &Value) -> CandidateMoment {
    let Some(map) = item.as_object() else {
        let mut candidate = CandidateMoment::new(rank, format!("Moment {}", rank + 1), 0.0, 0.0);
        let raw = format!("moment is {}", type_name(item));
        candidate.start_time = MomentTime::Malformed(raw.clone());
        candidate.end_time = MomentTime::Malformed(raw);
        return candidate;
    };

    let quote = first_string(map, &["quote"]);
    let title = first_string(map, TITLE_KEYS)
        .or_else(|| quote.as_deref().map(|q| first_words(q, 8)))
        .unwrap_or_else(|| format!("Moment {}", rank + 1));

    let (start_time, end_time) = times(map);

    CandidateMoment {
        rank,
        title,
        start_time,
        end_time,
        rationale: first_string(map, RATIONALE_KEYS).unwrap_or_default(),
        virality_score: first_number(map, SCORE_KEYS),
        quote,
        hook_category: first_string(map, HOOK_KEYS),
        caption: first_string(map, CAPTION_KEYS),
    }
}

fn times(map: &Map<String, Value>) -> (MomentTime, MomentTime) {
    let start = first_present(map, START_KEYS);
    let end = first_present(map, END_KEYS);

    if start.is_none() && end.is_none() {
        if let Some(Value::String(range)) = map.get("timestamps") {
            return split_range(range);
        }
    }

    (
        start.map(time_value).unwrap_or_else(|| missing("start")),
        end.map(time_value).unwrap_or_else(|| missing("end")),
    )
}

fn missing(which: &str) -> MomentTime {
    MomentTime::Malformed(format!("missing {which} time"))
}

fn time_value(value: &Value) -> MomentTime {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(secs) => MomentTime::from_seconds(secs),
            None => MomentTime::Malformed(n.to_string()),
        },
        Value::String(s) => time_string(s),
        other => MomentTime::Malformed(other.to_string()),
    }
}

fn time_string(raw: &str) -> MomentTime {
    let trimmed = raw.trim().trim_end_matches('s');
    match parse_timestamp(trimmed) {
        Ok(secs) => MomentTime::from_seconds(secs),
        Err(_) => MomentTime::Malformed(raw.to_string()),
    }
}

/// Split `"00:04.23-00:21.90"` (hyphen, en dash or "to") into two times.
fn split_range(range: &str) -> (MomentTime, MomentTime) {
    let separators = ["–", "—", " to ", "-"];
    for sep in separators {
        if let Some((a, b)) = range.split_once(sep) {
            if !a.trim().is_empty() {
                return (time_string(a), time_string(b));
            }
        }
    }
    (
        MomentTime::Malformed(range.to_string()),
        MomentTime::Malformed(range.to_string()),
    )
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_number(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| map.get(*k)).find_map(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn first_words(text: &str, count: usize) -> String {
    text.split_whitespace().take(count).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_envelope() {
        let raw = r#"{"moments": [
            {"title": "Cold open", "start_time": 4.2, "end_time": 21.9, "rationale": "shock",
             "virality_score": 0.9, "hook_category": "shock"},
            {"title": "Twist", "start_time": 40, "end_time": 61}
        ]}"#;
        let moments = parse_moments(raw).unwrap();
        assert_eq!(moments.len(), 2);
        assert_eq!(moments[0].rank, 0);
        assert_eq!(moments[0].start_time, MomentTime::Seconds(4.2));
        assert_eq!(moments[0].virality_score, Some(0.9));
        assert_eq!(moments[1].rank, 1);
        assert_eq!(moments[1].end_time, MomentTime::Seconds(61.0));
    }

    #[test]
    fn test_code_fence_and_prose() {
        let fenced = "```json\n[{\"title\": \"a\", \"start\": \"00:01:00\", \"end\": \"00:01:20.5\"}]\n```";
        let moments = parse_moments(fenced).unwrap();
        assert_eq!(moments[0].start_time, MomentTime::Seconds(60.0));
        assert_eq!(moments[0].end_time, MomentTime::Seconds(80.5));

        let chatty = "Sure! Here you go:\n{\"highlights\": [{\"title\": \"b\", \"start_time\": 1, \"end_time\": 9}]}\nEnjoy.";
        assert_eq!(parse_moments(chatty).unwrap().len(), 1);
    }

    #[test]
    fn test_combined_timestamps_field() {
        let raw = r#"{"moments": [{"timestamps": "00:04.23-00:21.90", "quote": "Nobody tells you this about money",
            "why_it_hits": "contrarian", "viral_trigger": "SHOCK"}]}"#;
        let moments = parse_moments(raw).unwrap();
        let m = &moments[0];
        assert_eq!(m.start_time.seconds().map(|s| (s * 100.0).round()), Some(423.0));
        assert_eq!(m.end_time.seconds().map(|s| (s * 100.0).round()), Some(2190.0));
        assert_eq!(m.title, "Nobody tells you this about money");
        assert_eq!(m.rationale, "contrarian");
        assert_eq!(m.hook_category.as_deref(), Some("SHOCK"));
    }

    #[test]
    fn test_single_moment_object() {
        let raw = r#"{"title": "Solo", "start_time": 3, "end_time": 12}"#;
        let moments = parse_moments(raw).unwrap();
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].title, "Solo");
    }

    #[test]
    fn test_malformed_times_are_kept() {
        let raw = r#"[{"title": "x", "start_time": "around the middle", "end_time": null},
                      {"title": "y", "start_time": -3, "end_time": "0:45"},
                      "not an object"]"#;
        let moments = parse_moments(raw).unwrap();
        assert_eq!(moments.len(), 3);
        assert_eq!(
            moments[0].start_time,
            MomentTime::Malformed("around the middle".to_string())
        );
        assert_eq!(moments[0].end_time, MomentTime::Malformed("missing end time".to_string()));
        assert_eq!(moments[1].start_time, MomentTime::Seconds(-3.0));
        assert_eq!(moments[1].end_time, MomentTime::Seconds(45.0));
        assert!(matches!(moments[2].start_time, MomentTime::Malformed(_)));
    }

    #[test]
    fn test_empty_list_is_not_an_error() {
        assert!(parse_moments(r#"{"moments": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_unparsable_output() {
        assert!(matches!(parse_moments("I could not find anything."), Err(AiError::Parse(_))));
        assert!(matches!(parse_moments(""), Err(AiError::Parse(_))));
        assert!(matches!(parse_moments(r#"{"answer": 42}"#), Err(AiError::Parse(_))));
        assert!(matches!(parse_moments(r#"{"moments": "none"}"#), Err(AiError::Parse(_))));
    }
}
