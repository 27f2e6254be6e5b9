//! Candidate moments returned by the AI service.
//!
//! Candidates are untrusted. Times that could not be read as numbers are kept
//! as [`MomentTime::Malformed`] so the validator can report them instead of
//! the parser silently dropping them.

use serde::{Deserialize, Serialize};

/// A start or end time as reported by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MomentTime {
    Seconds(f64),
    Malformed(String),
}

impl MomentTime {
    /// Wrap a number, demoting non-finite values to `Malformed`.
    pub fn from_seconds(value: f64) -> Self {
        if value.is_finite() {
            Self::Seconds(value)
        } else {
            Self::Malformed(value.to_string())
        }
    }

    /// Usable seconds value: finite and non-negative.
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::Seconds(value) if value.is_finite() && *value >= 0.0 => Some(*value),
            _ => None,
        }
    }
}

impl std::fmt::Display for MomentTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seconds(value) => write!(f, "{value}"),
            Self::Malformed(raw) => write!(f, "{raw:?}"),
        }
    }
}

/// Raw moment proposed by the model, with its position in the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMoment {
    /// Zero-based position in the AI response (0 = strongest pick).
    pub rank: usize,
    pub title: String,
    pub start_time: MomentTime,
    pub end_time: MomentTime,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virality_score: Option<f64>,
    /// Verbatim line that carries the moment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    /// Why it spreads (e.g. "controversy", "relatable").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_category: Option<String>,
    /// Suggested social caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl CandidateMoment {
    /// Candidate with numeric times and no optional metadata.
    pub fn new(rank: usize, title: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            rank,
            title: title.into(),
            start_time: MomentTime::from_seconds(start_time),
            end_time: MomentTime::from_seconds(end_time),
            rationale: String::new(),
            virality_score: None,
            quote: None,
            hook_category: None,
            caption: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moment_time_seconds() {
        assert_eq!(MomentTime::Seconds(4.5).seconds(), Some(4.5));
        assert_eq!(MomentTime::Seconds(-1.0).seconds(), None);
        assert_eq!(MomentTime::Malformed("soon".into()).seconds(), None);
        assert!(matches!(MomentTime::from_seconds(f64::NAN), MomentTime::Malformed(_)));
    }

    #[test]
    fn test_untagged_serde() {
        let json = r#"{"rank":0,"title":"t","start_time":1.5,"end_time":"later"}"#;
        let moment: CandidateMoment = serde_json::from_str(json).unwrap();
        assert_eq!(moment.start_time, MomentTime::Seconds(1.5));
        assert_eq!(moment.end_time, MomentTime::Malformed("later".into()));
        assert!(moment.rationale.is_empty());
    }
}
