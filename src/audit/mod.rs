pub mod migrations;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gate::ConfirmedOverride;

/// One confirmed override as recorded in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub opportunity_id: String,
    pub from_site: String,
    pub to_site: String,
    pub risk_score: u8,
    pub required_approval: bool,
    pub justification: String,
    pub impact_json: String,
    pub confirmed_at: DateTime<Utc>,
}

impl OverrideRecord {
    pub fn from_confirmed(confirmed: &ConfirmedOverride) -> anyhow::Result<Self> {
        Ok(Self {
            opportunity_id: confirmed.opportunity_id.clone(),
            from_site: confirmed.impact.original_site.id.clone(),
            to_site: confirmed.proposed_site.id.clone(),
            risk_score: confirmed.impact.risk_score,
            required_approval: confirmed.impact.requires_approval,
            justification: confirmed.justification.clone(),
            impact_json: serde_json::to_string(&confirmed.impact)?,
            confirmed_at: Utc::now(),
        })
    }
}
