//! Validation metrics.

use metrics::counter;

use momentcut_models::RejectionReason;

/// Metric names as constants for consistency.
pub mod names {
    pub const CANDIDATES_REJECTED_TOTAL: &str = "momentcut_candidates_rejected_total";
    pub const SEGMENTS_VALIDATED_TOTAL: &str = "momentcut_segments_validated_total";
}

/// Short label for a rejection reason.
pub fn rejection_kind(reason: &RejectionReason) -> &'static str {
    match reason {
        RejectionReason::Malformed { .. } => "malformed",
        RejectionReason::TooShort { .. } => "too_short",
        RejectionReason::Overlap { .. } => "overlap",
    }
}

pub fn record_rejection(reason: &RejectionReason) {
    let labels = [("reason", rejection_kind(reason).to_string())];
    counter!(names::CANDIDATES_REJECTED_TOTAL, &labels).increment(1);
}

pub fn record_validated(count: usize) {
    counter!(names::SEGMENTS_VALIDATED_TOTAL).increment(count as u64);
}
