use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Active filter selection. An empty set places no constraint on its axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub teams: BTreeSet<Uuid>,
    pub domains: BTreeSet<Uuid>,
    pub super_domains: BTreeSet<Uuid>,
}

/// Partial filter update; axes left as `None` keep their current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPatch {
    pub teams: Option<BTreeSet<Uuid>>,
    pub domains: Option<BTreeSet<Uuid>>,
    pub super_domains: Option<BTreeSet<Uuid>>,
}

impl FilterState {
    /// Merge `patch` into the selection. Ids are not validated.
    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(teams) = patch.teams {
            self.teams = teams;
        }
        if let Some(domains) = patch.domains {
            self.domains = domains;
        }
        if let Some(super_domains) = patch.super_domains {
            self.super_domains = super_domains;
        }
    }

    pub fn toggle_team(&mut self, id: Uuid) {
        toggle(&mut self.teams, id);
    }

    pub fn toggle_domain(&mut self, id: Uuid) {
        toggle(&mut self.domains, id);
    }

    pub fn toggle_super_domain(&mut self, id: Uuid) {
        toggle(&mut self.super_domains, id);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of selected ids across all three axes.
    pub fn active_count(&self) -> usize {
        self.teams.len() + self.domains.len() + self.super_domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }
}

fn toggle(set: &mut BTreeSet<Uuid>, id: Uuid) {
    if !set.remove(&id) {
        set.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_untouched_axes() {
        let team = Uuid::new_v4();
        let domain = Uuid::new_v4();
        let mut filters = FilterState::default();
        filters.toggle_team(team);

        filters.merge(FilterPatch {
            domains: Some(BTreeSet::from([domain])),
            ..Default::default()
        });

        assert!(filters.teams.contains(&team));
        assert!(filters.domains.contains(&domain));
        assert_eq!(filters.active_count(), 2);
    }

    #[test]
    fn test_toggle_twice_deselects() {
        let id = Uuid::new_v4();
        let mut filters = FilterState::default();
        filters.toggle_super_domain(id);
        filters.toggle_super_domain(id);
        assert!(filters.is_empty());
    }
}
