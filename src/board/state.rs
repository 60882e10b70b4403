use uuid::Uuid;

use crate::models::*;
use crate::views::{self, BoardLayout, QuarterGroup};

/// Where the initial load stands. Only `Ready` renders the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    /// The load failed with this backend message; retry re-runs the whole load.
    Failed(String),
    Ready,
}

/// A write that failed and was rolled back, kept so it can be shown and retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub operation: FailedOperation,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailedOperation {
    Edit { item_id: Uuid, edit: ItemEdit },
    Insert(NewRoadmapItem),
    Delete { item_id: Uuid },
}

/// The board's single source of truth: the five collections, the filter
/// selection, load progress and the last failed write.
///
/// Nothing here fails. Setters for an unknown item id are no-ops and return `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    data: BoardData,
    filters: FilterState,
    phase: LoadPhase,
    failure: Option<MutationFailure>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A loaded state over `data`, mainly for building views from synthetic data.
    pub fn from_data(data: BoardData) -> Self {
        let mut state = Self::default();
        state.load(data);
        state
    }

    /// Replace all five collections wholesale and mark the board ready.
    pub fn load(&mut self, data: BoardData) {
        self.data = data;
        self.phase = LoadPhase::Ready;
    }

    pub(crate) fn begin_loading(&mut self) {
        self.phase = LoadPhase::Loading;
    }

    pub(crate) fn fail_loading(&mut self, message: String) {
        self.phase = LoadPhase::Failed(message);
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn data(&self) -> &BoardData {
        &self.data
    }

    pub fn teams(&self) -> &[Team] {
        &self.data.teams
    }

    pub fn super_domains(&self) -> &[SuperDomain] {
        &self.data.super_domains
    }

    pub fn domains(&self) -> &[Domain] {
        &self.data.domains
    }

    pub fn sprints(&self) -> &[Sprint] {
        &self.data.sprints
    }

    pub fn items(&self) -> &[RoadmapItem] {
        &self.data.items
    }

    pub fn item(&self, id: Uuid) -> Option<&RoadmapItem> {
        self.data.items.iter().find(|i| i.id == id)
    }

    pub fn is_sprint(&self, id: Uuid) -> bool {
        self.data.sprints.iter().any(|s| s.id == id)
    }

    // ============================================================
    // Filters
    // ============================================================

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    /// Merge a partial selection into the current filters.
    pub fn set_filters(&mut self, patch: FilterPatch) {
        self.filters.merge(patch);
    }

    // ============================================================
    // Item field setters
    //
    // Each replaces one field of one item in place and returns the value it
    // overwrote, which is what a rollback re-applies.
    // ============================================================

    pub fn set_item_title(&mut self, id: Uuid, title: String) -> Option<String> {
        self.replace_field(id, |item| std::mem::replace(&mut item.title, title))
    }

    pub fn set_item_description(&mut self, id: Uuid, description: String) -> Option<String> {
        self.replace_field(id, |item| std::mem::replace(&mut item.description, description))
    }

    pub fn set_item_domain(&mut self, id: Uuid, domain_id: Option<Uuid>) -> Option<Option<Uuid>> {
        self.replace_field(id, |item| std::mem::replace(&mut item.domain_id, domain_id))
    }

    pub fn set_item_priority(&mut self, id: Uuid, priority: Priority) -> Option<Priority> {
        self.replace_field(id, |item| std::mem::replace(&mut item.priority, priority))
    }

    pub fn set_item_effort(&mut self, id: Uuid, effort: Effort) -> Option<Effort> {
        self.replace_field(id, |item| std::mem::replace(&mut item.effort, effort))
    }

    pub fn set_item_status(&mut self, id: Uuid, status: ItemStatus) -> Option<ItemStatus> {
        self.replace_field(id, |item| std::mem::replace(&mut item.status, status))
    }

    pub fn set_item_due_date(
        &mut self,
        id: Uuid,
        due_date: Option<chrono::NaiveDate>,
    ) -> Option<Option<chrono::NaiveDate>> {
        self.replace_field(id, |item| std::mem::replace(&mut item.due_date, due_date))
    }

    pub fn set_item_sprint(&mut self, id: Uuid, sprint_id: Option<Uuid>) -> Option<Option<Uuid>> {
        self.replace_field(id, |item| std::mem::replace(&mut item.sprint_id, sprint_id))
    }

    /// Route `edit` through the matching field setter; returns the previous value.
    pub fn apply_edit(&mut self, id: Uuid, edit: ItemEdit) -> Option<ItemEdit> {
        match edit {
            ItemEdit::Title(v) => self.set_item_title(id, v).map(ItemEdit::Title),
            ItemEdit::Description(v) => self.set_item_description(id, v).map(ItemEdit::Description),
            ItemEdit::DomainId(v) => self.set_item_domain(id, v).map(ItemEdit::DomainId),
            ItemEdit::Priority(v) => self.set_item_priority(id, v).map(ItemEdit::Priority),
            ItemEdit::Effort(v) => self.set_item_effort(id, v).map(ItemEdit::Effort),
            ItemEdit::Status(v) => self.set_item_status(id, v).map(ItemEdit::Status),
            ItemEdit::DueDate(v) => self.set_item_due_date(id, v).map(ItemEdit::DueDate),
            ItemEdit::SprintId(v) => self.set_item_sprint(id, v).map(ItemEdit::SprintId),
        }
    }

    fn replace_field<T>(&mut self, id: Uuid, f: impl FnOnce(&mut RoadmapItem) -> T) -> Option<T> {
        self.data.items.iter_mut().find(|i| i.id == id).map(f)
    }

    pub(crate) fn push_item(&mut self, item: RoadmapItem) {
        self.data.items.push(item);
    }

    /// Remove an item, returning it with its position so it can be restored.
    pub(crate) fn remove_item(&mut self, id: Uuid) -> Option<(usize, RoadmapItem)> {
        let index = self.data.items.iter().position(|i| i.id == id)?;
        Some((index, self.data.items.remove(index)))
    }

    pub(crate) fn restore_item(&mut self, index: usize, item: RoadmapItem) {
        let index = index.min(self.data.items.len());
        self.data.items.insert(index, item);
    }

    // ============================================================
    // Failures
    // ============================================================

    pub fn failure(&self) -> Option<&MutationFailure> {
        self.failure.as_ref()
    }

    pub(crate) fn record_failure(&mut self, failure: MutationFailure) {
        self.failure = Some(failure);
    }

    pub fn clear_failure(&mut self) {
        self.failure = None;
    }

    // ============================================================
    // Derived views
    // ============================================================

    pub fn filtered_items(&self) -> Vec<&RoadmapItem> {
        views::filter_items(&self.data.items, &self.data.domains, &self.filters)
    }

    pub fn grouped_sprints(&self) -> Vec<QuarterGroup<'_>> {
        views::group_sprints_by_quarter(&self.data.sprints)
    }

    pub fn layout(&self) -> BoardLayout<'_> {
        BoardLayout::build(&self.data, &self.filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(title: &str) -> RoadmapItem {
        RoadmapItem {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            status: ItemStatus::Planned,
            priority: Priority::Medium,
            effort: Effort::Medium,
            due_date: None,
            team_id: None,
            domain_id: None,
            sprint_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn state_with(items: Vec<RoadmapItem>) -> BoardState {
        BoardState::from_data(BoardData {
            items,
            ..Default::default()
        })
    }

    #[test]
    fn test_setter_touches_only_target_item() {
        let a = item("A");
        let b = item("B");
        let mut state = state_with(vec![a.clone(), b.clone()]);

        let previous = state.set_item_priority(a.id, Priority::Critical);

        assert_eq!(previous, Some(Priority::Medium));
        assert_eq!(state.item(a.id).unwrap().priority, Priority::Critical);
        assert_eq!(state.item(b.id), Some(&b));
    }

    #[test]
    fn test_apply_edit_round_trips_previous_value() {
        let a = item("A");
        let mut state = state_with(vec![a.clone()]);

        let previous = state.apply_edit(a.id, ItemEdit::Title("B".into())).unwrap();
        assert_eq!(state.item(a.id).unwrap().title, "B");

        state.apply_edit(a.id, previous);
        assert_eq!(state.item(a.id), Some(&a));
    }

    #[test]
    fn test_unknown_item_is_a_noop() {
        let mut state = state_with(vec![item("A")]);
        let before = state.clone();
        assert!(state.set_item_sprint(Uuid::new_v4(), None).is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn test_filters_never_mutate_items() {
        let a = item("A");
        let mut state = state_with(vec![a.clone()]);
        state.filters_mut().toggle_team(Uuid::new_v4());

        assert!(state.filtered_items().is_empty());
        assert_eq!(state.items(), &[a]);
    }

    #[test]
    fn test_remove_and_restore_keeps_position() {
        let items = vec![item("A"), item("B"), item("C")];
        let mut state = state_with(items.clone());

        let (index, removed) = state.remove_item(items[1].id).unwrap();
        assert_eq!(index, 1);
        assert_eq!(state.items().len(), 2);

        state.restore_item(index, removed);
        assert_eq!(state.items(), items.as_slice());
    }
}
