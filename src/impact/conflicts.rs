use crate::impact::{Conflict, ConflictSeverity};
use crate::types::{CollectionOpportunity, Site};

/// Finds every other opportunity already allocated to the proposed site.
/// `all_opportunities` may include the opportunity under analysis; it is
/// excluded by id. Output follows input iteration order.
pub fn detect_conflicts(
    opportunity: &CollectionOpportunity,
    proposed_site: &Site,
    all_opportunities: &[CollectionOpportunity],
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for other in all_opportunities {
        if other.id == opportunity.id {
            continue;
        }
        if !other.is_allocated_to(&proposed_site.id) {
            continue;
        }
        conflicts.push(Conflict {
            opportunity_id: other.id.clone(),
            conflicts_with: other.name.clone(),
            reason: format!(
                "{} is already allocated to {} ({} priority)",
                other.name, proposed_site.name, other.priority
            ),
            severity: ConflictSeverity::from_priority(other.priority),
        });
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn site(id: &str) -> Site {
        Site::new(id, id.to_uppercase(), 100, 40)
    }

    fn opportunity(id: &str, priority: Priority, sites: Vec<Site>) -> CollectionOpportunity {
        CollectionOpportunity {
            id: id.to_string(),
            name: format!("Pass {id}"),
            satellite: format!("sat-{id}"),
            allocated_sites: sites,
            priority,
            match_quality: None,
        }
    }

    #[test]
    fn excludes_the_opportunity_itself() {
        let proposed = site("gs-2");
        let a = opportunity("a", Priority::Medium, vec![proposed.clone()]);
        let b = opportunity("b", Priority::Critical, vec![proposed.clone()]);
        let all = vec![a.clone(), b];

        let conflicts = detect_conflicts(&a, &proposed, &all);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].opportunity_id, "b");
        assert_eq!(conflicts[0].severity, ConflictSeverity::High);
    }

    #[test]
    fn severity_follows_other_priority() {
        assert_eq!(
            ConflictSeverity::from_priority(Priority::Critical),
            ConflictSeverity::High
        );
        assert_eq!(
            ConflictSeverity::from_priority(Priority::High),
            ConflictSeverity::Medium
        );
        assert_eq!(
            ConflictSeverity::from_priority(Priority::Medium),
            ConflictSeverity::Low
        );
        assert_eq!(
            ConflictSeverity::from_priority(Priority::Low),
            ConflictSeverity::Low
        );
    }

    #[test]
    fn ignores_opportunities_on_other_sites() {
        let proposed = site("gs-2");
        let a = opportunity("a", Priority::Medium, vec![site("gs-1")]);
        let b = opportunity("b", Priority::High, vec![site("gs-3")]);
        let all = vec![b];

        let conflicts = detect_conflicts(&a, &proposed, &all);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn preserves_input_order() {
        let proposed = site("gs-2");
        let a = opportunity("a", Priority::Medium, vec![site("gs-1")]);
        let all = vec![
            opportunity("c", Priority::Low, vec![proposed.clone()]),
            opportunity("b", Priority::High, vec![proposed.clone()]),
        ];

        let conflicts = detect_conflicts(&a, &proposed, &all);
        let ids: Vec<&str> = conflicts.iter().map(|c| c.opportunity_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }
}
