use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default match quality assumed when an opportunity carries no baseline.
pub const DEFAULT_MATCH_QUALITY: f64 = 75.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    pub allocated: u32,
}

impl Site {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        capacity: u32,
        allocated: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            allocated,
        }
    }

    pub fn utilization_pct(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.allocated) / f64::from(self.capacity) * 100.0
    }

    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.allocated)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown priority: {0}")]
pub struct PriorityParseError(pub String);

impl FromStr for Priority {
    type Err = PriorityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" | "crit" => Ok(Self::Critical),
            _ => Err(PriorityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionOpportunity {
    pub id: String,
    pub name: String,
    pub satellite: String,
    pub allocated_sites: Vec<Site>,
    pub priority: Priority,
    #[serde(default)]
    pub match_quality: Option<f64>,
}

impl CollectionOpportunity {
    /// The site currently serving this opportunity. The first allocated
    /// entry is treated as the original assignment.
    pub fn original_site(&self) -> Option<&Site> {
        self.allocated_sites.first()
    }

    pub fn baseline_quality(&self) -> f64 {
        self.match_quality.unwrap_or(DEFAULT_MATCH_QUALITY)
    }

    pub fn is_allocated_to(&self, site_id: &str) -> bool {
        self.allocated_sites.iter().any(|s| s.id == site_id)
    }
}
