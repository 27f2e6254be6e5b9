//! Cutting metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const CLIPS_CUT_TOTAL: &str = "momentcut_clips_cut_total";
    pub const CUT_DURATION_SECONDS: &str = "momentcut_cut_duration_seconds";
    pub const CUT_FALLBACKS_TOTAL: &str = "momentcut_cut_fallbacks_total";
}

/// Record a finished clip.
pub fn record_clip(status: &str, mode: &str) {
    let labels = [("status", status.to_string()), ("mode", mode.to_string())];
    counter!(names::CLIPS_CUT_TOTAL, &labels).increment(1);
}

/// Record how long one cut attempt took.
pub fn record_cut_duration(mode: &str, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    histogram!(names::CUT_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a fallback from stream copy to re-encode.
pub fn record_fallback() {
    counter!(names::CUT_FALLBACKS_TOTAL).increment(1);
}
