//! Column layout of the board: quarter columns of sprint columns, then one
//! backlog column per team.

use uuid::Uuid;

use super::{filter_items, group_sprints_by_quarter};
use crate::models::*;

/// Placeholder for a team or domain reference that does not resolve.
pub const UNKNOWN: &str = "Unknown";

/// An item with its references resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card<'a> {
    pub item: &'a RoadmapItem,
    pub team_name: &'a str,
    pub domain_name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintColumn<'a> {
    pub sprint: &'a Sprint,
    pub cards: Vec<Card<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarterColumn<'a> {
    pub label: String,
    pub sprints: Vec<SprintColumn<'a>>,
}

/// Unscheduled items of one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamBacklog<'a> {
    pub team: &'a Team,
    pub cards: Vec<Card<'a>>,
}

/// Progress overview over the visible items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    /// Completed share of `total`, rounded to the nearest percent.
    pub progress_percent: u32,
}

impl BoardStats {
    pub fn of<'a>(items: impl IntoIterator<Item = &'a RoadmapItem>) -> Self {
        let mut stats = Self::default();
        for item in items {
            stats.total += 1;
            match item.status {
                ItemStatus::Completed => stats.completed += 1,
                ItemStatus::InProgress => stats.in_progress += 1,
                ItemStatus::Planned | ItemStatus::Cancelled => {}
            }
        }
        if stats.total > 0 {
            stats.progress_percent =
                ((stats.completed as f64 / stats.total as f64) * 100.0).round() as u32;
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLayout<'a> {
    pub quarters: Vec<QuarterColumn<'a>>,
    pub backlogs: Vec<TeamBacklog<'a>>,
    pub stats: BoardStats,
}

impl<'a> BoardLayout<'a> {
    /// Lay out the filtered items of `data`.
    ///
    /// Backlog items whose team does not resolve have no column and are not shown.
    pub fn build(data: &'a BoardData, filters: &FilterState) -> Self {
        let visible = filter_items(&data.items, &data.domains, filters);
        let card = move |item: &'a RoadmapItem| Card {
            item,
            team_name: team_name(&data.teams, item.team_id),
            domain_name: domain_name(&data.domains, item.domain_id),
        };

        let quarters = group_sprints_by_quarter(&data.sprints)
            .into_iter()
            .map(|group| QuarterColumn {
                label: group.label,
                sprints: group
                    .sprints
                    .into_iter()
                    .map(|sprint| SprintColumn {
                        sprint,
                        cards: visible
                            .iter()
                            .filter(|item| item.sprint_id == Some(sprint.id))
                            .map(|item| card(*item))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let backlogs = data
            .teams
            .iter()
            .map(|team| TeamBacklog {
                team,
                cards: visible
                    .iter()
                    .filter(|item| item.is_in_backlog() && item.team_id == Some(team.id))
                    .map(|item| card(*item))
                    .collect(),
            })
            .collect();

        Self {
            quarters,
            backlogs,
            stats: BoardStats::of(visible.iter().copied()),
        }
    }
}

pub fn team_name(teams: &[Team], id: Option<Uuid>) -> &str {
    id.and_then(|id| teams.iter().find(|t| t.id == id))
        .map_or(UNKNOWN, |t| t.name.as_str())
}

pub fn domain_name(domains: &[Domain], id: Option<Uuid>) -> &str {
    id.and_then(|id| domains.iter().find(|d| d.id == id))
        .map_or(UNKNOWN, |d| d.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn team(name: &str) -> Team {
        Team {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            color: "#1B3A29".to_string(),
        }
    }

    fn sprint(name: &str) -> Sprint {
        Sprint {
            id: Uuid::new_v4(),
            name: name.to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 25).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 10, 8).unwrap(),
            status: "planned".to_string(),
        }
    }

    fn item(title: &str, team: Option<Uuid>, sprint: Option<Uuid>, status: ItemStatus) -> RoadmapItem {
        RoadmapItem {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            status,
            priority: Priority::Medium,
            effort: Effort::Medium,
            due_date: None,
            team_id: team,
            domain_id: None,
            sprint_id: sprint,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_items_land_in_their_sprint_or_team_backlog() {
        let platform = team("Platform");
        let mobile = team("Mobile");
        let s1 = sprint("S1");
        let s23 = sprint("S23 FY25");
        let data = BoardData {
            items: vec![
                item("Scheduled", Some(platform.id), Some(s1.id), ItemStatus::InProgress),
                item("Old", Some(mobile.id), Some(s23.id), ItemStatus::Completed),
                item("Backlog", Some(mobile.id), None, ItemStatus::Planned),
                item("Orphan", None, None, ItemStatus::Planned),
            ],
            teams: vec![platform, mobile],
            sprints: vec![s1, s23],
            ..Default::default()
        };

        let layout = BoardLayout::build(&data, &FilterState::default());

        assert_eq!(layout.quarters.len(), 2);
        assert_eq!(layout.quarters[0].label, "Q4 FY25");
        assert_eq!(layout.quarters[0].sprints[0].cards[0].item.title, "Old");
        assert_eq!(layout.quarters[1].sprints[0].cards[0].item.title, "Scheduled");

        assert!(layout.backlogs[0].cards.is_empty());
        assert_eq!(layout.backlogs[1].cards.len(), 1);
        assert_eq!(layout.backlogs[1].cards[0].item.title, "Backlog");

        assert_eq!(layout.stats.total, 4);
        assert_eq!(layout.stats.completed, 1);
        assert_eq!(layout.stats.in_progress, 1);
        assert_eq!(layout.stats.progress_percent, 25);
    }

    #[test]
    fn test_unresolved_references_render_unknown() {
        let s1 = sprint("S1");
        let data = BoardData {
            items: vec![item("Lost", Some(Uuid::new_v4()), Some(s1.id), ItemStatus::Planned)],
            sprints: vec![s1],
            ..Default::default()
        };

        let layout = BoardLayout::build(&data, &FilterState::default());
        let card = &layout.quarters[0].sprints[0].cards[0];
        assert_eq!(card.team_name, UNKNOWN);
        assert_eq!(card.domain_name, UNKNOWN);
    }

    #[test]
    fn test_stats_on_empty_board() {
        let stats = BoardStats::of(std::iter::empty());
        assert_eq!(stats, BoardStats::default());
    }
}
