use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OverrideError;
use crate::estimator::QualityEstimator;
use crate::impact::calculator::calculate_impact;
use crate::impact::OverrideImpact;
use crate::types::{CollectionOpportunity, Site};

/// Where one override attempt currently stands. `ImpactReady` from the
/// workflow description is transient: `result_ready` branches straight to
/// `AwaitingJustification` or `ReadyToConfirm`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum GateState {
    Idle,
    SiteSelected {
        site: Site,
    },
    Calculating {
        site: Site,
        generation: u64,
    },
    AwaitingJustification {
        site: Site,
        impact: OverrideImpact,
    },
    ReadyToConfirm {
        site: Site,
        impact: OverrideImpact,
        justification: String,
    },
    Confirmed,
    Cancelled,
}

/// Emitted to the caller on confirmation. Applying the reallocation is the
/// caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmedOverride {
    pub opportunity_id: String,
    pub proposed_site: Site,
    pub justification: String,
    pub impact: OverrideImpact,
}

/// Drives one override attempt for one opportunity. Each attempt gets its
/// own gate; no state is shared between attempts. Results arriving for a
/// superseded request generation are dropped.
#[derive(Debug, Clone)]
pub struct ApprovalGate {
    opportunity_id: String,
    state: GateState,
    generation: u64,
}

impl ApprovalGate {
    pub fn new(opportunity_id: impl Into<String>) -> Self {
        Self {
            opportunity_id: opportunity_id.into(),
            state: GateState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn opportunity_id(&self) -> &str {
        &self.opportunity_id
    }

    /// Picks (or re-picks) a candidate site. Selecting while a computation
    /// is in flight supersedes it: the old generation's result will be
    /// ignored. No-op on terminal states.
    pub fn select_site(&mut self, site: Site) {
        if matches!(self.state, GateState::Confirmed | GateState::Cancelled) {
            return;
        }
        self.state = GateState::SiteSelected { site };
    }

    /// Starts an impact computation for the selected site, returning the
    /// generation tag the eventual result must carry.
    pub fn request_impact(&mut self) -> Option<u64> {
        let site = match &self.state {
            GateState::SiteSelected { site } => site.clone(),
            GateState::Calculating { site, .. } => site.clone(),
            _ => return None,
        };
        self.generation += 1;
        let generation = self.generation;
        self.state = GateState::Calculating { site, generation };
        Some(generation)
    }

    /// Applies a finished computation. Returns false when the result is
    /// stale (its generation was superseded) or the gate is not calculating.
    pub fn result_ready(&mut self, generation: u64, impact: OverrideImpact) -> bool {
        let site = match &self.state {
            GateState::Calculating {
                site,
                generation: current,
            } if *current == generation => site.clone(),
            _ => return false,
        };
        self.state = if impact.requires_approval {
            GateState::AwaitingJustification { site, impact }
        } else {
            GateState::ReadyToConfirm {
                site,
                impact,
                justification: String::new(),
            }
        };
        true
    }

    /// Records the operator's rationale. Blank text leaves the gate in
    /// `AwaitingJustification`; confirm stays unreachable.
    pub fn provide_justification(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        let (site, impact) = match &self.state {
            GateState::AwaitingJustification { site, impact } => (site.clone(), impact.clone()),
            _ => return false,
        };
        self.state = GateState::ReadyToConfirm {
            site,
            impact,
            justification: trimmed.to_string(),
        };
        true
    }

    /// Confirms the override, consuming the transient impact and
    /// justification. Only reachable from `ReadyToConfirm`.
    pub fn confirm(&mut self) -> Option<ConfirmedOverride> {
        let (site, impact, justification) = match &self.state {
            GateState::ReadyToConfirm {
                site,
                impact,
                justification,
            } => (site.clone(), impact.clone(), justification.clone()),
            _ => return None,
        };
        self.state = GateState::Confirmed;
        Some(ConfirmedOverride {
            opportunity_id: self.opportunity_id.clone(),
            proposed_site: site,
            justification,
            impact,
        })
    }

    /// Abandons the attempt, discarding all transient data. Confirmed gates
    /// stay confirmed.
    pub fn cancel(&mut self) -> bool {
        if matches!(self.state, GateState::Confirmed) {
            return false;
        }
        self.state = GateState::Cancelled;
        true
    }
}

/// Result of driving a gate end to end in one shot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum OverrideOutcome {
    Confirmed(ConfirmedOverride),
    /// High-risk override with no justification supplied; the impact is
    /// returned so the caller can present it and re-submit with a rationale.
    NeedsJustification { impact: OverrideImpact },
}

/// Drives a fresh gate through select, calculate and confirm. Used by the
/// CLI and REST surfaces, where the whole flow happens in one request.
pub async fn run_override(
    opportunity: &CollectionOpportunity,
    proposed_site: &Site,
    all_opportunities: &[CollectionOpportunity],
    estimator: &dyn QualityEstimator,
    estimator_timeout: Duration,
    justification: Option<&str>,
) -> Result<OverrideOutcome, OverrideError> {
    let mut gate = ApprovalGate::new(&opportunity.id);
    gate.select_site(proposed_site.clone());
    let generation = gate
        .request_impact()
        .ok_or_else(|| OverrideError::insufficient("no proposed site selected"))?;

    let impact = calculate_impact(
        opportunity,
        proposed_site,
        all_opportunities,
        estimator,
        estimator_timeout,
    )
    .await?;
    gate.result_ready(generation, impact.clone());

    if matches!(gate.state(), GateState::AwaitingJustification { .. }) {
        match justification {
            Some(text) if gate.provide_justification(text) => {}
            _ => {
                gate.cancel();
                return Ok(OverrideOutcome::NeedsJustification { impact });
            }
        }
    }

    let confirmed = gate
        .confirm()
        .ok_or_else(|| OverrideError::insufficient("gate is not ready to confirm"))?;
    Ok(OverrideOutcome::Confirmed(confirmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::BaselineEstimator;
    use crate::types::Priority;

    fn site(id: &str, capacity: u32, allocated: u32) -> Site {
        Site::new(id, id.to_uppercase(), capacity, allocated)
    }

    fn opportunity(id: &str, sites: Vec<Site>) -> CollectionOpportunity {
        CollectionOpportunity {
            id: id.to_string(),
            name: format!("Pass {id}"),
            satellite: format!("sat-{id}"),
            allocated_sites: sites,
            priority: Priority::Medium,
            match_quality: Some(80.0),
        }
    }

    async fn impact_for(
        opp: &CollectionOpportunity,
        proposed: &Site,
        all: &[CollectionOpportunity],
    ) -> OverrideImpact {
        calculate_impact(
            opp,
            proposed,
            all,
            &BaselineEstimator,
            Duration::from_millis(100),
        )
        .await
        .expect("computable")
    }

    #[tokio::test]
    async fn low_risk_flows_straight_to_confirm() {
        let original = site("gs-1", 100, 60);
        let proposed = site("gs-2", 100, 10);
        let opp = opportunity("a", vec![original]);
        let impact = impact_for(&opp, &proposed, &[opp.clone()]).await;
        assert!(!impact.requires_approval);

        let mut gate = ApprovalGate::new(&opp.id);
        gate.select_site(proposed.clone());
        let generation = gate.request_impact().expect("selected");
        assert!(gate.result_ready(generation, impact));
        assert!(matches!(gate.state(), GateState::ReadyToConfirm { .. }));

        let confirmed = gate.confirm().expect("ready");
        assert_eq!(confirmed.opportunity_id, "a");
        assert_eq!(confirmed.proposed_site.id, "gs-2");
        assert!(confirmed.justification.is_empty());
        assert!(matches!(gate.state(), GateState::Confirmed));
    }

    #[tokio::test]
    async fn high_risk_demands_a_justification() {
        let original = site("gs-1", 100, 5);
        let proposed = site("gs-2", 10, 9);
        let opp = opportunity("a", vec![original]);
        let all = vec![
            opp.clone(),
            opportunity("b", vec![proposed.clone()]),
            opportunity("c", vec![proposed.clone()]),
            opportunity("d", vec![proposed.clone()]),
        ];
        let impact = impact_for(&opp, &proposed, &all).await;
        assert!(impact.requires_approval);

        let mut gate = ApprovalGate::new(&opp.id);
        gate.select_site(proposed);
        let generation = gate.request_impact().expect("selected");
        gate.result_ready(generation, impact);
        assert!(matches!(gate.state(), GateState::AwaitingJustification { .. }));

        // Confirm is unreachable until a non-blank justification lands.
        assert!(gate.confirm().is_none());
        assert!(!gate.provide_justification("   "));
        assert!(matches!(gate.state(), GateState::AwaitingJustification { .. }));

        assert!(gate.provide_justification("  Priority tasking from mission control.  "));
        let confirmed = gate.confirm().expect("justified");
        assert_eq!(
            confirmed.justification,
            "Priority tasking from mission control."
        );
    }

    #[tokio::test]
    async fn stale_results_are_dropped() {
        let original = site("gs-1", 100, 60);
        let site_x = site("gs-x", 100, 10);
        let site_y = site("gs-y", 100, 20);
        let opp = opportunity("a", vec![original]);

        let impact_x = impact_for(&opp, &site_x, &[opp.clone()]).await;
        let impact_y = impact_for(&opp, &site_y, &[opp.clone()]).await;

        let mut gate = ApprovalGate::new(&opp.id);
        gate.select_site(site_x);
        let generation_x = gate.request_impact().expect("selected");

        // Operator re-picks before X's computation resolves.
        gate.select_site(site_y.clone());
        let generation_y = gate.request_impact().expect("selected");

        assert!(!gate.result_ready(generation_x, impact_x));
        assert!(matches!(gate.state(), GateState::Calculating { .. }));

        assert!(gate.result_ready(generation_y, impact_y));
        match gate.state() {
            GateState::ReadyToConfirm { site, .. } => assert_eq!(site.id, "gs-y"),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_discards_everything_except_confirmed() {
        let original = site("gs-1", 100, 60);
        let proposed = site("gs-2", 100, 10);
        let opp = opportunity("a", vec![original]);
        let impact = impact_for(&opp, &proposed, &[opp.clone()]).await;

        let mut gate = ApprovalGate::new(&opp.id);
        gate.select_site(proposed.clone());
        let generation = gate.request_impact().expect("selected");
        gate.result_ready(generation, impact);
        assert!(gate.cancel());
        assert!(matches!(gate.state(), GateState::Cancelled));
        assert!(gate.confirm().is_none());

        let mut confirmed_gate = ApprovalGate::new("b");
        confirmed_gate.state = GateState::Confirmed;
        assert!(!confirmed_gate.cancel());
    }

    #[test]
    fn request_impact_needs_a_selected_site() {
        let mut gate = ApprovalGate::new("a");
        assert!(gate.request_impact().is_none());
    }

    #[tokio::test]
    async fn run_override_confirms_low_risk_without_justification() {
        let original = site("gs-1", 100, 60);
        let proposed = site("gs-2", 100, 10);
        let opp = opportunity("a", vec![original]);

        let outcome = run_override(
            &opp,
            &proposed,
            &[opp.clone()],
            &BaselineEstimator,
            Duration::from_millis(100),
            None,
        )
        .await
        .expect("computable");

        match outcome {
            OverrideOutcome::Confirmed(confirmed) => {
                assert_eq!(confirmed.proposed_site.id, "gs-2");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_override_reports_missing_justification() {
        let original = site("gs-1", 100, 5);
        let proposed = site("gs-2", 10, 9);
        let opp = opportunity("a", vec![original]);
        let all = vec![
            opp.clone(),
            opportunity("b", vec![proposed.clone()]),
            opportunity("c", vec![proposed.clone()]),
            opportunity("d", vec![proposed.clone()]),
        ];

        let outcome = run_override(
            &opp,
            &proposed,
            &all,
            &BaselineEstimator,
            Duration::from_millis(100),
            None,
        )
        .await
        .expect("computable");
        assert!(matches!(
            outcome,
            OverrideOutcome::NeedsJustification { .. }
        ));

        let outcome = run_override(
            &opp,
            &proposed,
            &all,
            &BaselineEstimator,
            Duration::from_millis(100),
            Some("Ground maintenance window at gs-1."),
        )
        .await
        .expect("computable");
        assert!(matches!(outcome, OverrideOutcome::Confirmed(_)));
    }
}
