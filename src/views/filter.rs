use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{Domain, FilterState, RoadmapItem};

/// Items that satisfy every non-empty filter axis, in their original order.
///
/// - team axis: `team_id` is selected
/// - domain axis: `domain_id` is selected
/// - super-domain axis: `domain_id` names a domain whose super-domain is selected
///
/// Items with a null team or domain never match a non-empty axis on that field.
pub fn filter_items<'a>(
    items: &'a [RoadmapItem],
    domains: &[Domain],
    filters: &FilterState,
) -> Vec<&'a RoadmapItem> {
    let super_domain_members: Option<HashSet<Uuid>> = if filters.super_domains.is_empty() {
        None
    } else {
        Some(
            domains
                .iter()
                .filter(|d| filters.super_domains.contains(&d.super_domain_id))
                .map(|d| d.id)
                .collect(),
        )
    };

    items
        .iter()
        .filter(|item| {
            axis_allows(&filters.teams, item.team_id)
                && axis_allows(&filters.domains, item.domain_id)
                && match (&super_domain_members, item.domain_id) {
                    (None, _) => true,
                    (Some(members), Some(domain_id)) => members.contains(&domain_id),
                    (Some(_), None) => false,
                }
        })
        .collect()
}

fn axis_allows(selected: &std::collections::BTreeSet<Uuid>, id: Option<Uuid>) -> bool {
    selected.is_empty() || id.is_some_and(|id| selected.contains(&id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use chrono::Utc;

    fn item(team_id: Option<Uuid>, domain_id: Option<Uuid>) -> RoadmapItem {
        RoadmapItem {
            id: Uuid::new_v4(),
            title: "Item".to_string(),
            description: String::new(),
            status: ItemStatus::Planned,
            priority: Priority::Medium,
            effort: Effort::Medium,
            due_date: None,
            team_id,
            domain_id,
            sprint_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn domain(super_domain_id: Uuid) -> Domain {
        Domain {
            id: Uuid::new_v4(),
            name: "Domain".to_string(),
            description: String::new(),
            color: String::new(),
            super_domain_id,
        }
    }

    struct Fixture {
        teams: [Uuid; 2],
        super_domains: [Uuid; 2],
        domains: Vec<Domain>,
        items: Vec<RoadmapItem>,
    }

    fn fixture() -> Fixture {
        let teams = [Uuid::new_v4(), Uuid::new_v4()];
        let super_domains = [Uuid::new_v4(), Uuid::new_v4()];
        let domains = vec![
            domain(super_domains[0]),
            domain(super_domains[0]),
            domain(super_domains[1]),
        ];
        let mut items = Vec::new();
        for team in teams {
            for d in &domains {
                items.push(item(Some(team), Some(d.id)));
            }
        }
        items.push(item(None, None));
        Fixture {
            teams,
            super_domains,
            domains,
            items,
        }
    }

    #[test]
    fn test_empty_filters_return_everything() {
        let f = fixture();
        let filtered = filter_items(&f.items, &f.domains, &FilterState::default());
        assert_eq!(filtered.len(), f.items.len());
    }

    #[test]
    fn test_team_filter() {
        let f = fixture();
        let mut filters = FilterState::default();
        filters.toggle_team(f.teams[0]);

        let filtered = filter_items(&f.items, &f.domains, &filters);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|i| i.team_id == Some(f.teams[0])));
    }

    #[test]
    fn test_super_domain_filter_uses_domain_membership() {
        let f = fixture();
        let mut filters = FilterState::default();
        filters.toggle_super_domain(f.super_domains[1]);

        let filtered = filter_items(&f.items, &f.domains, &filters);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|i| i.domain_id == Some(f.domains[2].id)));
    }

    #[test]
    fn test_axes_are_anded() {
        let f = fixture();
        let mut filters = FilterState::default();
        filters.toggle_team(f.teams[1]);
        filters.toggle_domain(f.domains[0].id);
        filters.toggle_super_domain(f.super_domains[0]);

        let filtered = filter_items(&f.items, &f.domains, &filters);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].team_id, Some(f.teams[1]));
        assert_eq!(filtered[0].domain_id, Some(f.domains[0].id));

        // Domain from the other super-domain cannot satisfy both axes
        filters.domains.clear();
        filters.toggle_domain(f.domains[2].id);
        assert!(filter_items(&f.items, &f.domains, &filters).is_empty());
    }

    #[test]
    fn test_membership_matches_predicate_for_every_combination() {
        let f = fixture();
        let team_choices = [vec![], vec![f.teams[0]], vec![f.teams[0], f.teams[1]]];
        let domain_choices = [vec![], vec![f.domains[1].id], vec![f.domains[0].id, f.domains[2].id]];
        let super_choices = [vec![], vec![f.super_domains[0]], vec![f.super_domains[1]]];

        for teams in &team_choices {
            for domains in &domain_choices {
                for supers in &super_choices {
                    let filters = FilterState {
                        teams: teams.iter().copied().collect(),
                        domains: domains.iter().copied().collect(),
                        super_domains: supers.iter().copied().collect(),
                    };
                    let filtered = filter_items(&f.items, &f.domains, &filters);

                    for item in &f.items {
                        let super_of = item.domain_id.and_then(|id| {
                            f.domains.iter().find(|d| d.id == id).map(|d| d.super_domain_id)
                        });
                        let expected = (teams.is_empty() || item.team_id.is_some_and(|t| teams.contains(&t)))
                            && (domains.is_empty() || item.domain_id.is_some_and(|d| domains.contains(&d)))
                            && (supers.is_empty() || super_of.is_some_and(|s| supers.contains(&s)));
                        let present = filtered.iter().any(|i| i.id == item.id);
                        assert_eq!(present, expected);
                    }
                }
            }
        }
    }
}
