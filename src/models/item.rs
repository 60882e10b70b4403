use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of planned work, placed in a sprint or left in its team's backlog.
///
/// `team_id` and `domain_id` are nullable in the store. Rows pointing at a missing
/// team or domain still load; the board renders them as "Unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub id: Uuid,
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: ItemStatus,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub effort: Effort,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub domain_id: Option<Uuid>,
    /// `None` means the item sits in its team's backlog.
    #[serde(default)]
    pub sprint_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoadmapItem {
    pub fn is_in_backlog(&self) -> bool {
        self.sprint_id.is_none()
    }

    /// Current value of `field`, expressed as the edit that would restore it.
    pub fn current_value(&self, field: ItemField) -> ItemEdit {
        match field {
            ItemField::Title => ItemEdit::Title(self.title.clone()),
            ItemField::Description => ItemEdit::Description(self.description.clone()),
            ItemField::Domain => ItemEdit::DomainId(self.domain_id),
            ItemField::Priority => ItemEdit::Priority(self.priority),
            ItemField::Effort => ItemEdit::Effort(self.effort),
            ItemField::Status => ItemEdit::Status(self.status),
            ItemField::DueDate => ItemEdit::DueDate(self.due_date),
            ItemField::Sprint => ItemEdit::SprintId(self.sprint_id),
        }
    }
}

/// Progress state of a roadmap item.
///
/// The store has held both `in_progress` and `in-progress`; both parse as
/// [`ItemStatus::InProgress`], which is written back as `in_progress`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Planned,
    #[serde(alias = "in-progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant::new("status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(UnknownVariant::new("priority", other)),
        }
    }
}

/// T-shirt size estimate. Missing values are treated as `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Small,
    #[default]
    Medium,
    Large,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl FromStr for Effort {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(UnknownVariant::new("effort", other)),
        }
    }
}

/// Returned when a status/priority/effort string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// The editable fields of a roadmap item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    Title,
    Description,
    Domain,
    Priority,
    Effort,
    Status,
    DueDate,
    Sprint,
}

impl ItemField {
    /// Column name in the `roadmap_items` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Domain => "domain_id",
            Self::Priority => "priority",
            Self::Effort => "effort",
            Self::Status => "status",
            Self::DueDate => "due_date",
            Self::Sprint => "sprint_id",
        }
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A change to exactly one field of a roadmap item.
///
/// Serializes to the single-column update body the store expects, e.g.
/// `{"title": "New title"}` or `{"sprint_id": null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEdit {
    Title(String),
    Description(String),
    DomainId(Option<Uuid>),
    Priority(Priority),
    Effort(Effort),
    Status(ItemStatus),
    DueDate(Option<NaiveDate>),
    SprintId(Option<Uuid>),
}

impl ItemEdit {
    pub fn field(&self) -> ItemField {
        match self {
            Self::Title(_) => ItemField::Title,
            Self::Description(_) => ItemField::Description,
            Self::DomainId(_) => ItemField::Domain,
            Self::Priority(_) => ItemField::Priority,
            Self::Effort(_) => ItemField::Effort,
            Self::Status(_) => ItemField::Status,
            Self::DueDate(_) => ItemField::DueDate,
            Self::SprintId(_) => ItemField::Sprint,
        }
    }

    /// Write this edit into `item`, returning the value it replaced.
    pub fn apply_to(self, item: &mut RoadmapItem) -> ItemEdit {
        match self {
            Self::Title(v) => Self::Title(std::mem::replace(&mut item.title, v)),
            Self::Description(v) => Self::Description(std::mem::replace(&mut item.description, v)),
            Self::DomainId(v) => Self::DomainId(std::mem::replace(&mut item.domain_id, v)),
            Self::Priority(v) => Self::Priority(std::mem::replace(&mut item.priority, v)),
            Self::Effort(v) => Self::Effort(std::mem::replace(&mut item.effort, v)),
            Self::Status(v) => Self::Status(std::mem::replace(&mut item.status, v)),
            Self::DueDate(v) => Self::DueDate(std::mem::replace(&mut item.due_date, v)),
            Self::SprintId(v) => Self::SprintId(std::mem::replace(&mut item.sprint_id, v)),
        }
    }
}

/// Input for creating a new roadmap item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoadmapItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub effort: Effort,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Unselected team/domain/sprint are stored as `null`.
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub domain_id: Option<Uuid>,
    #[serde(default)]
    pub sprint_id: Option<Uuid>,
}

impl NewRoadmapItem {
    /// A planned, medium priority, medium effort backlog item.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: ItemStatus::default(),
            priority: Priority::default(),
            effort: Effort::default(),
            due_date: None,
            team_id: None,
            domain_id: None,
            sprint_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> RoadmapItem {
        RoadmapItem {
            id: Uuid::new_v4(),
            title: "A".to_string(),
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

    #[test]
    fn test_edit_serializes_to_single_column_body() {
        let body = serde_json::to_value(ItemEdit::Title("B".into())).unwrap();
        assert_eq!(body, serde_json::json!({ "title": "B" }));

        let body = serde_json::to_value(ItemEdit::SprintId(None)).unwrap();
        assert_eq!(body, serde_json::json!({ "sprint_id": null }));

        let body = serde_json::to_value(ItemEdit::Status(ItemStatus::InProgress)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "in_progress" }));
    }

    #[test]
    fn test_edit_parses_from_update_body() {
        let edit: ItemEdit = serde_json::from_str(r#"{"due_date":"2026-03-01"}"#).unwrap();
        assert_eq!(
            edit,
            ItemEdit::DueDate(NaiveDate::from_ymd_opt(2026, 3, 1))
        );
    }

    #[test]
    fn test_apply_returns_previous_value() {
        let mut item = item();
        let previous = ItemEdit::Title("B".into()).apply_to(&mut item);
        assert_eq!(item.title, "B");
        assert_eq!(previous, ItemEdit::Title("A".into()));
    }

    #[test]
    fn test_status_accepts_both_spellings() {
        assert_eq!("in-progress".parse::<ItemStatus>(), Ok(ItemStatus::InProgress));
        assert_eq!("in_progress".parse::<ItemStatus>(), Ok(ItemStatus::InProgress));
        let parsed: ItemStatus = serde_json::from_str(r#""in-progress""#).unwrap();
        assert_eq!(parsed, ItemStatus::InProgress);
        assert!("not-started".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn test_null_columns_fall_back_to_defaults() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "title": "Imported",
            "description": null,
            "status": "completed",
            "priority": "high",
            "effort": null,
            "team_id": null,
            "domain_id": null,
            "created_at": "2025-07-01T00:00:00Z",
            "updated_at": "2025-07-01T00:00:00Z"
        });
        let item: RoadmapItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.description, "");
        assert_eq!(item.effort, Effort::Medium);
        assert!(item.is_in_backlog());
    }
}
