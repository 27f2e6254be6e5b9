//! Timestamp parsing and formatting utilities.
//!
//! Accepts `HH:MM:SS`, `MM:SS` and `SS`, each with an optional fractional
//! part (`.mmm` or the SRT-style `,mmm`).

use thiserror::Error;

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use momentcut_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("00:00:04,250").unwrap(), 4.25);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let normalized = ts.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    const UNITS: [(&str, f64); 3] = [("seconds", 1.0), ("minutes", 60.0), ("hours", 3600.0)];

    let mut total = 0.0;
    for (part, (name, scale)) in parts.iter().rev().zip(UNITS) {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| TimestampError::InvalidValue(name, part.to_string()))?;
        if !value.is_finite() {
            return Err(TimestampError::InvalidValue(name, part.to_string()));
        }
        if value < 0.0 || part.trim_start().starts_with('-') {
            return Err(TimestampError::Negative);
        }
        total += value * scale;
    }

    Ok(total)
}

/// Format seconds as `HH:MM:SS`, truncating fractional seconds.
pub fn format_hms(total_secs: f64) -> String {
    let whole = total_secs.max(0.0).floor() as u64;
    format!("{:02}:{:02}:{:02}", whole / 3600, (whole % 3600) / 60, whole % 60)
}

/// Format seconds as `HH:MM:SS.mmm`, rounded to the millisecond.
pub fn format_precise(total_secs: f64) -> String {
    let millis = (total_secs.max(0.0) * 1000.0).round() as u64;
    let secs = millis / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis % 1000
    )
}

/// Format seconds as an FFmpeg time argument (`12.345`).
pub fn format_ffmpeg_time(total_secs: f64) -> String {
    format!("{:.3}", total_secs.max(0.0))
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("timestamp cannot be empty")]
    Empty,

    #[error("timestamp cannot be negative")]
    Negative,

    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("invalid timestamp format '{0}', expected HH:MM:SS, MM:SS or SS")]
    InvalidFormat(String),
}
