//! Extraction metrics.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const AI_CALLS_TOTAL: &str = "momentcut_ai_calls_total";
    pub const MOMENT_CACHE_HITS_TOTAL: &str = "momentcut_moment_cache_hits_total";
}

/// Record one model call and how it ended.
pub fn record_ai_call(model: &str, outcome: &str) {
    let labels = [("model", model.to_string()), ("outcome", outcome.to_string())];
    counter!(names::AI_CALLS_TOTAL, &labels).increment(1);
}

pub fn record_cache_hit() {
    counter!(names::MOMENT_CACHE_HITS_TOTAL).increment(1);
}
