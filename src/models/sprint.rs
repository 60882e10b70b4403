use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fixed, date-ranged work period.
///
/// The `name` encodes the fiscal period (`"S4"`, `"S23 FY25"`, `"Q3 2025"`). It is
/// free text and only used for display grouping, see [`crate::views::quarter_label`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Free-text status as stored by the backend (`planned`, `completed`, ...).
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: String,
}
