use crate::impact::{QualityImpact, RiskLevel};

/// Builds the quality delta between the current baseline and the value the
/// estimator predicts for the proposed site.
pub fn quality_impact(original: f64, proposed: f64) -> QualityImpact {
    let delta = proposed - original;
    QualityImpact {
        original,
        proposed,
        delta,
        risk_level: risk_level_for_delta(delta),
    }
}

pub fn risk_level_for_delta(delta: f64) -> RiskLevel {
    let magnitude = delta.abs();
    if magnitude > 15.0 {
        RiskLevel::High
    } else if magnitude > 5.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_tiers() {
        assert_eq!(risk_level_for_delta(0.0), RiskLevel::Low);
        assert_eq!(risk_level_for_delta(5.0), RiskLevel::Low);
        assert_eq!(risk_level_for_delta(-6.0), RiskLevel::Medium);
        assert_eq!(risk_level_for_delta(15.0), RiskLevel::Medium);
        assert_eq!(risk_level_for_delta(16.0), RiskLevel::High);
        assert_eq!(risk_level_for_delta(-20.0), RiskLevel::High);
    }

    #[test]
    fn delta_is_proposed_minus_original() {
        let impact = quality_impact(75.0, 68.0);
        assert_eq!(impact.delta, -7.0);
        assert_eq!(impact.risk_level, RiskLevel::Medium);
    }
}
