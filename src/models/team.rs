use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A delivery team. Items are owned by a team and unscheduled items appear in
/// that team's backlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    /// Hex color used for the team swatch, e.g. `#1B3A29`.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub color: String,
}
