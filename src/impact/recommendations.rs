/// Builds operator guidance from the computed signals. Rules fire
/// independently; every qualifying message is included, in a stable order
/// for display.
pub fn build_recommendations(
    risk_score: u8,
    capacity_delta: f64,
    conflict_count: usize,
    quality_delta: f64,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if risk_score > 70 {
        recommendations
            .push("High risk override: requires senior mission approval.".to_string());
    }
    if capacity_delta > 15.0 {
        recommendations.push("Monitor site capacity closely after allocation.".to_string());
    }
    if conflict_count > 0 {
        recommendations.push("Coordinate with affected mission planners.".to_string());
    }
    if quality_delta > 10.0 {
        recommendations
            .push("Quality improvement detected; favorable override.".to_string());
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_inputs_produce_no_recommendations() {
        assert!(build_recommendations(10, 0.0, 0, 0.0).is_empty());
    }

    #[test]
    fn all_rules_can_fire_together() {
        let recs = build_recommendations(80, 20.0, 1, 12.0);
        assert_eq!(recs.len(), 4);
        assert!(recs[0].contains("High risk"));
        assert!(recs[3].contains("Quality improvement"));
    }

    #[test]
    fn rules_are_independent() {
        let recs = build_recommendations(50, 0.0, 2, 0.0);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("mission planners"));
    }
}
