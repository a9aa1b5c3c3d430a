use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::audit::OverrideRecord;
use crate::impact::{Conflict, OverrideImpact};
use crate::types::{CollectionOpportunity, Site};

pub fn render_sites_table(sites: &[Site]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Site", "Name", "Capacity", "Allocated", "Utilization"]);

    for site in sites {
        let utilization = site.utilization_pct();
        let utilization_cell = if utilization >= 90.0 {
            Cell::new(format!("{utilization:.1}%")).fg(Color::Red)
        } else if utilization >= 70.0 {
            Cell::new(format!("{utilization:.1}%")).fg(Color::Yellow)
        } else {
            Cell::new(format!("{utilization:.1}%")).fg(Color::Green)
        };
        table.add_row(Row::from(vec![
            Cell::new(&site.id),
            Cell::new(&site.name),
            Cell::new(site.capacity),
            Cell::new(site.allocated),
            utilization_cell,
        ]));
    }
    table.to_string()
}

pub fn render_opportunities_table(opportunities: &[CollectionOpportunity]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Opportunity",
        "Name",
        "Satellite",
        "Priority",
        "Site",
        "Quality",
    ]);

    for opp in opportunities {
        table.add_row(vec![
            opp.id.clone(),
            opp.name.clone(),
            opp.satellite.clone(),
            opp.priority.to_string().to_uppercase(),
            opp.original_site()
                .map(|s| s.id.clone())
                .unwrap_or_else(|| "-".to_string()),
            opp.match_quality
                .map(|q| format!("{q:.0}"))
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.to_string()
}

pub fn render_impact_table(impact: &OverrideImpact) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Signal", "Value"]);

    let risk_cell = if impact.requires_approval {
        Cell::new(format!("{} (approval required)", impact.risk_score)).fg(Color::Red)
    } else {
        Cell::new(impact.risk_score.to_string()).fg(Color::Green)
    };

    table.add_row(vec![
        Cell::new("Override"),
        Cell::new(format!(
            "{} -> {}",
            impact.original_site.id, impact.proposed_site.id
        )),
    ]);
    table.add_row(vec![Cell::new("Risk score"), risk_cell]);
    table.add_row(vec![
        Cell::new("Capacity"),
        Cell::new(format!(
            "{:.1}% -> {:.1}% (delta {:+.2})",
            impact.capacity_impact.original_pct,
            impact.capacity_impact.proposed_pct,
            impact.capacity_impact.delta
        )),
    ]);
    table.add_row(vec![
        Cell::new("Quality"),
        Cell::new(format!(
            "{:.1} -> {:.1} (delta {:+.1}, {:?} risk)",
            impact.quality_impact.original,
            impact.quality_impact.proposed,
            impact.quality_impact.delta,
            impact.quality_impact.risk_level
        )),
    ]);
    table.add_row(vec![
        Cell::new("Conflicts"),
        Cell::new(impact.conflicting_opportunities.len().to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Affected satellites"),
        Cell::new(
            impact
                .affected_satellites
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ]);

    for finding in &impact.operational_impacts {
        table.add_row(vec![
            Cell::new(format!("{:?} finding", finding.kind)),
            Cell::new(format!("{} | {}", finding.description, finding.mitigation)),
        ]);
    }
    for recommendation in &impact.recommendations {
        table.add_row(vec![Cell::new("Recommendation"), Cell::new(recommendation)]);
    }
    table.to_string()
}

pub fn render_conflicts_table(conflicts: &[Conflict]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Opportunity", "Conflicts With", "Severity", "Reason"]);

    for conflict in conflicts {
        let severity = format!("{:?}", conflict.severity).to_uppercase();
        table.add_row(vec![
            conflict.opportunity_id.clone(),
            conflict.conflicts_with.clone(),
            severity,
            conflict.reason.clone(),
        ]);
    }
    table.to_string()
}

pub fn render_history_table(records: &[OverrideRecord]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Confirmed",
        "Opportunity",
        "From",
        "To",
        "Risk",
        "Justification",
    ]);

    for record in records {
        table.add_row(vec![
            record.confirmed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.opportunity_id.clone(),
            record.from_site.clone(),
            record.to_site.clone(),
            record.risk_score.to_string(),
            if record.justification.is_empty() {
                "-".to_string()
            } else {
                record.justification.clone()
            },
        ]);
    }
    table.to_string()
}
