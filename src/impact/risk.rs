use crate::impact::{CAPACITY_RISK_CAP, CONFLICT_RISK_WEIGHT};

/// Accumulates the bounded 0..=100 risk score. The capacity term is capped
/// at 30, each conflict adds 15, and only quality decreases penalize.
/// These weights are a compatibility contract; downstream approval gating
/// and recorded history depend on them.
pub fn score_risk(capacity_delta: f64, conflict_count: usize, quality_delta: f64) -> u8 {
    let capacity_term = capacity_delta.max(0.0).min(CAPACITY_RISK_CAP);
    let conflict_term = conflict_count as f64 * CONFLICT_RISK_WEIGHT;
    let quality_term = (-quality_delta).max(0.0);

    let total = capacity_term + conflict_term + quality_term;
    total.clamp(0.0, 100.0).round() as u8
}
