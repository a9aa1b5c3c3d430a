pub mod calculator;
pub mod capacity;
pub mod conflicts;
pub mod quality;
pub mod recommendations;
pub mod risk;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Priority, Site};

/// Risk score above which an override requires a captured justification.
pub const APPROVAL_THRESHOLD: u8 = 60;
/// Cap on the capacity contribution to the risk score.
pub const CAPACITY_RISK_CAP: f64 = 30.0;
/// Risk points added per conflicting opportunity.
pub const CONFLICT_RISK_WEIGHT: f64 = 15.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conflict {
    pub opportunity_id: String,
    pub conflicts_with: String,
    pub reason: String,
    pub severity: ConflictSeverity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

impl ConflictSeverity {
    /// Severity is driven by the priority of the opportunity already
    /// holding the proposed site.
    pub fn from_priority(priority: Priority) -> Self {
        match priority {
            Priority::Critical => Self::High,
            Priority::High => Self::Medium,
            Priority::Medium | Priority::Low => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityImpact {
    pub original_pct: f64,
    pub proposed_pct: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityImpact {
    pub original: f64,
    pub proposed: f64,
    pub delta: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationalKind {
    Capacity,
    Schedule,
    Mission,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImpactSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationalImpact {
    pub kind: OperationalKind,
    pub severity: ImpactSeverity,
    pub description: String,
    pub mitigation: String,
}

/// Complete result of one impact computation. Immutable once produced;
/// a new (opportunity, site) pair always yields a fresh record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverrideImpact {
    pub opportunity_id: String,
    pub original_site: Site,
    pub proposed_site: Site,
    pub capacity_impact: CapacityImpact,
    pub affected_satellites: BTreeSet<String>,
    pub affected_sites: BTreeSet<String>,
    pub conflicting_opportunities: Vec<Conflict>,
    pub quality_impact: QualityImpact,
    pub operational_impacts: Vec<OperationalImpact>,
    pub recommendations: Vec<String>,
    pub requires_approval: bool,
    pub risk_score: u8,
}
