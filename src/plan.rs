use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{CollectionOpportunity, Priority, Site};

/// The working set the engine analyzes: every ground site and every
/// collection opportunity under consideration. Loaded from a JSON plan
/// file exported by the planning dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionPlan {
    pub sites: Vec<Site>,
    pub opportunities: Vec<CollectionOpportunity>,
}

impl CollectionPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading plan file: {}", path.display()))?;
        let plan: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing plan file: {}", path.display()))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<()> {
        for site in &self.sites {
            if site.capacity == 0 {
                bail!("site {} has zero capacity", site.id);
            }
            if self.sites.iter().filter(|s| s.id == site.id).count() > 1 {
                bail!("duplicate site id: {}", site.id);
            }
        }
        for opportunity in &self.opportunities {
            if self
                .opportunities
                .iter()
                .filter(|o| o.id == opportunity.id)
                .count()
                > 1
            {
                bail!("duplicate opportunity id: {}", opportunity.id);
            }
        }
        Ok(())
    }

    pub fn site(&self, id: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.id == id)
    }

    pub fn opportunity(&self, id: &str) -> Option<&CollectionOpportunity> {
        self.opportunities.iter().find(|o| o.id == id)
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating plan directory: {}", parent.display()))?;
        }
        let sample = serde_json::to_string_pretty(&Self::sample())?;
        fs::write(path, sample)
            .with_context(|| format!("failed writing plan template: {}", path.display()))
    }

    /// A small built-in plan used for demos and as the `plan --init`
    /// template.
    pub fn sample() -> Self {
        let fairbanks = Site::new("gs-fairbanks", "Fairbanks AK", 100, 60);
        let svalbard = Site::new("gs-svalbard", "Svalbard", 80, 40);
        let punta = Site::new("gs-punta", "Punta Arenas", 60, 55);
        let wallops = Site::new("gs-wallops", "Wallops Island", 40, 12);

        let opportunities = vec![
            CollectionOpportunity {
                id: "opp-1001".to_string(),
                name: "Arctic ice sheet survey".to_string(),
                satellite: "ICEYE-X14".to_string(),
                allocated_sites: vec![fairbanks.clone()],
                priority: Priority::High,
                match_quality: Some(88.0),
            },
            CollectionOpportunity {
                id: "opp-1002".to_string(),
                name: "Wildfire perimeter tasking".to_string(),
                satellite: "SKYSAT-19".to_string(),
                allocated_sites: vec![svalbard.clone()],
                priority: Priority::Critical,
                match_quality: Some(92.0),
            },
            CollectionOpportunity {
                id: "opp-1003".to_string(),
                name: "Coastal erosion monitoring".to_string(),
                satellite: "SENTINEL-2C".to_string(),
                allocated_sites: vec![punta.clone()],
                priority: Priority::Medium,
                match_quality: Some(71.0),
            },
            CollectionOpportunity {
                id: "opp-1004".to_string(),
                name: "Port activity revisit".to_string(),
                satellite: "SKYSAT-19".to_string(),
                allocated_sites: vec![svalbard.clone()],
                priority: Priority::Low,
                match_quality: None,
            },
        ];

        Self {
            sites: vec![fairbanks, svalbard, punta, wallops],
            opportunities,
        }
    }
}
