use anyhow::Result;

use crate::audit::OverrideRecord;
use crate::impact::Conflict;
use crate::types::Site;

pub fn sites_to_csv(sites: &[Site]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["site_id", "name", "capacity", "allocated", "utilization_pct"])?;
    for site in sites {
        writer.write_record([
            site.id.clone(),
            site.name.clone(),
            site.capacity.to_string(),
            site.allocated.to_string(),
            format!("{:.2}", site.utilization_pct()),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn conflicts_to_csv(conflicts: &[Conflict]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["opportunity_id", "conflicts_with", "severity", "reason"])?;
    for conflict in conflicts {
        writer.write_record([
            conflict.opportunity_id.clone(),
            conflict.conflicts_with.clone(),
            format!("{:?}", conflict.severity).to_lowercase(),
            conflict.reason.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn history_to_csv(records: &[OverrideRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "confirmed_at",
        "opportunity_id",
        "from_site",
        "to_site",
        "risk_score",
        "required_approval",
        "justification",
    ])?;
    for record in records {
        writer.write_record([
            record.confirmed_at.to_rfc3339(),
            record.opportunity_id.clone(),
            record.from_site.clone(),
            record.to_site.clone(),
            record.risk_score.to_string(),
            record.required_approval.to_string(),
            record.justification.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
