use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::OverrideError;
use crate::estimator::{estimate_with_fallback, QualityEstimator};
use crate::impact::capacity::capacity_impact;
use crate::impact::conflicts::detect_conflicts;
use crate::impact::quality::quality_impact;
use crate::impact::recommendations::build_recommendations;
use crate::impact::risk::score_risk;
use crate::impact::{
    ImpactSeverity, OperationalImpact, OperationalKind, OverrideImpact, APPROVAL_THRESHOLD,
};
use crate::types::{CollectionOpportunity, Site};

/// Composes conflict detection, capacity and quality deltas, risk scoring
/// and recommendations into one immutable record. Pure given a
/// deterministic estimator; recomputing with identical inputs yields an
/// identical record.
pub async fn calculate_impact(
    opportunity: &CollectionOpportunity,
    proposed_site: &Site,
    all_opportunities: &[CollectionOpportunity],
    estimator: &dyn QualityEstimator,
    estimator_timeout: Duration,
) -> Result<OverrideImpact, OverrideError> {
    let original_site = opportunity
        .original_site()
        .ok_or_else(|| {
            OverrideError::insufficient(format!(
                "opportunity {} has no allocated site to override",
                opportunity.id
            ))
        })?
        .clone();

    let capacity = capacity_impact(&original_site, proposed_site)?;
    let conflicts = detect_conflicts(opportunity, proposed_site, all_opportunities);

    let baseline = opportunity.baseline_quality();
    let proposed_quality =
        estimate_with_fallback(estimator, opportunity, proposed_site, estimator_timeout).await;
    let quality = quality_impact(baseline, proposed_quality);

    let risk_score = score_risk(capacity.delta, conflicts.len(), quality.delta);
    let recommendations =
        build_recommendations(risk_score, capacity.delta, conflicts.len(), quality.delta);
    let operational_impacts = operational_findings(capacity.delta, &conflicts, quality.delta);

    let mut affected_satellites = BTreeSet::new();
    affected_satellites.insert(opportunity.satellite.clone());
    for conflict in &conflicts {
        if let Some(other) = all_opportunities
            .iter()
            .find(|o| o.id == conflict.opportunity_id)
        {
            affected_satellites.insert(other.satellite.clone());
        }
    }

    let mut affected_sites = BTreeSet::new();
    affected_sites.insert(original_site.id.clone());
    affected_sites.insert(proposed_site.id.clone());

    Ok(OverrideImpact {
        opportunity_id: opportunity.id.clone(),
        original_site,
        proposed_site: proposed_site.clone(),
        capacity_impact: capacity,
        affected_satellites,
        affected_sites,
        conflicting_opportunities: conflicts,
        quality_impact: quality,
        operational_impacts,
        recommendations,
        requires_approval: risk_score > APPROVAL_THRESHOLD,
        risk_score,
    })
}

fn operational_findings(
    capacity_delta: f64,
    conflicts: &[crate::impact::Conflict],
    quality_delta: f64,
) -> Vec<OperationalImpact> {
    let mut findings = Vec::new();

    if capacity_delta > 20.0 {
        findings.push(OperationalImpact {
            kind: OperationalKind::Capacity,
            severity: ImpactSeverity::High,
            description: format!(
                "Proposed site utilization rises {capacity_delta:.1} points above the current assignment"
            ),
            mitigation: "Review the proposed site's contact schedule and free capacity before \
                         committing further passes."
                .to_string(),
        });
    }
    if !conflicts.is_empty() {
        findings.push(OperationalImpact {
            kind: OperationalKind::Schedule,
            severity: ImpactSeverity::Medium,
            description: format!(
                "{} opportunit{} already scheduled on the proposed site",
                conflicts.len(),
                if conflicts.len() == 1 { "y" } else { "ies" }
            ),
            mitigation: "Deconflict pass windows with the owning mission planners.".to_string(),
        });
    }
    if quality_delta < -10.0 {
        findings.push(OperationalImpact {
            kind: OperationalKind::Mission,
            severity: ImpactSeverity::Medium,
            description: format!(
                "Estimated match quality drops {:.1} points on the proposed site",
                -quality_delta
            ),
            mitigation: "Confirm the degraded collection still meets mission requirements."
                .to_string(),
        });
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{BaselineEstimator, FixedOffsetEstimator};
    use crate::types::Priority;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn opportunity(
        id: &str,
        priority: Priority,
        sites: Vec<Site>,
        match_quality: Option<f64>,
    ) -> CollectionOpportunity {
        CollectionOpportunity {
            id: id.to_string(),
            name: format!("Pass {id}"),
            satellite: format!("sat-{id}"),
            allocated_sites: sites,
            priority,
            match_quality,
        }
    }

    #[tokio::test]
    async fn produces_a_complete_record() {
        let original = Site::new("gs-1", "Fairbanks", 100, 60);
        let proposed = Site::new("gs-2", "Svalbard", 80, 40);
        let opp = opportunity("a", Priority::Medium, vec![original.clone()], Some(75.0));

        let impact = calculate_impact(&opp, &proposed, &[opp.clone()], &BaselineEstimator, TIMEOUT)
            .await
            .expect("computable");

        assert_eq!(impact.capacity_impact.original_pct, 60.0);
        assert_eq!(impact.capacity_impact.proposed_pct, 51.25);
        assert_eq!(impact.capacity_impact.delta, -8.75);
        assert_eq!(impact.quality_impact.delta, 0.0);
        assert_eq!(impact.risk_score, 0);
        assert!(!impact.requires_approval);
        assert!(impact.conflicting_opportunities.is_empty());
        assert!(impact.affected_sites.contains("gs-1"));
        assert!(impact.affected_sites.contains("gs-2"));
    }

    #[tokio::test]
    async fn missing_original_site_is_insufficient_input() {
        let proposed = Site::new("gs-2", "Svalbard", 80, 40);
        let opp = opportunity("a", Priority::Medium, vec![], None);

        let err = calculate_impact(&opp, &proposed, &[], &BaselineEstimator, TIMEOUT)
            .await
            .expect_err("no original site");
        assert!(matches!(err, OverrideError::InsufficientInput { .. }));
    }

    #[tokio::test]
    async fn never_conflicts_with_itself() {
        let proposed = Site::new("gs-2", "Svalbard", 80, 40);
        let opp = opportunity("a", Priority::Medium, vec![proposed.clone()], None);

        let impact = calculate_impact(&opp, &proposed, &[opp.clone()], &BaselineEstimator, TIMEOUT)
            .await
            .expect("computable");
        assert!(impact.conflicting_opportunities.is_empty());
    }

    #[tokio::test]
    async fn high_risk_requires_approval() {
        // Near-full proposed site plus two conflicts plus quality loss.
        let original = Site::new("gs-1", "Fairbanks", 100, 10);
        let proposed = Site::new("gs-2", "Svalbard", 10, 9);
        let opp = opportunity("a", Priority::High, vec![original], Some(80.0));
        let all = vec![
            opp.clone(),
            opportunity("b", Priority::Critical, vec![proposed.clone()], None),
            opportunity("c", Priority::Low, vec![proposed.clone()], None),
        ];

        let impact = calculate_impact(
            &opp,
            &proposed,
            &all,
            &FixedOffsetEstimator::new(-12.0),
            TIMEOUT,
        )
        .await
        .expect("computable");

        // capacity: 100 - 10 = 90 -> capped at 30; conflicts: 2 * 15; quality: 12.
        assert_eq!(impact.risk_score, 72);
        assert!(impact.requires_approval);
        assert_eq!(impact.operational_impacts.len(), 3);
        assert!(impact
            .recommendations
            .iter()
            .any(|r| r.contains("High risk")));
    }

    #[tokio::test]
    async fn recomputation_is_deterministic() {
        let original = Site::new("gs-1", "Fairbanks", 100, 60);
        let proposed = Site::new("gs-2", "Svalbard", 80, 40);
        let opp = opportunity("a", Priority::Medium, vec![original], Some(82.0));
        let all = vec![
            opp.clone(),
            opportunity("b", Priority::High, vec![proposed.clone()], None),
        ];

        let first = calculate_impact(&opp, &proposed, &all, &BaselineEstimator, TIMEOUT)
            .await
            .expect("computable");
        let second = calculate_impact(&opp, &proposed, &all, &BaselineEstimator, TIMEOUT)
            .await
            .expect("computable");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn approval_tracks_the_threshold_exactly() {
        // One conflict and a capped capacity term: 30 + 15 = 45, below 60.
        let original = Site::new("gs-1", "Fairbanks", 100, 0);
        let proposed = Site::new("gs-2", "Svalbard", 10, 9);
        let opp = opportunity("a", Priority::Medium, vec![original], None);
        let all = vec![
            opp.clone(),
            opportunity("b", Priority::Low, vec![proposed.clone()], None),
        ];

        let impact = calculate_impact(&opp, &proposed, &all, &BaselineEstimator, TIMEOUT)
            .await
            .expect("computable");
        assert_eq!(impact.risk_score, 45);
        assert!(!impact.requires_approval);
    }

    #[tokio::test]
    async fn a_score_of_exactly_sixty_does_not_gate() {
        // Capped capacity term plus two conflicts: 30 + 30 = 60.
        let original = Site::new("gs-1", "Fairbanks", 100, 0);
        let proposed = Site::new("gs-2", "Svalbard", 10, 9);
        let opp = opportunity("a", Priority::Medium, vec![original], None);
        let all = vec![
            opp.clone(),
            opportunity("b", Priority::Low, vec![proposed.clone()], None),
            opportunity("c", Priority::Low, vec![proposed.clone()], None),
        ];

        let impact = calculate_impact(&opp, &proposed, &all, &BaselineEstimator, TIMEOUT)
            .await
            .expect("computable");
        assert_eq!(impact.risk_score, 60);
        assert!(!impact.requires_approval);
    }
}
