//! Domain models for the roadmap board.
//!
//! # Core Concepts
//!
//! ## Reference Data
//!
//! Maintained outside the board and immutable during a session:
//!
//! - [`Team`]: Owner of roadmap items; every team has its own backlog column.
//! - [`SuperDomain`]: Top-level grouping that owns one or more domains.
//! - [`Domain`]: A workstream of related work, belonging to exactly one super-domain.
//! - [`Sprint`]: A fixed date range. Its free-text name carries the fiscal period.
//!
//! ## Work Items
//!
//! - [`RoadmapItem`]: The only entity the board edits. Sits in a sprint, or in its
//!   team's backlog when `sprint_id` is `None`.
//! - [`ItemEdit`]: A single-field change to an item, the unit of optimistic mutation.
//!
//! ## View State
//!
//! - [`FilterState`]: Team/domain/super-domain selection. Narrows, never mutates.

mod domain;
mod filter;
mod item;
mod sprint;
mod team;

pub use domain::*;
pub use filter::*;
pub use item::*;
pub use sprint::*;
pub use team::*;

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable column into the type's default when the row holds `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Full contents of the five tables, as fetched on load or read from a fixture file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct BoardData {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub super_domains: Vec<SuperDomain>,
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub sprints: Vec<Sprint>,
    #[serde(default)]
    pub items: Vec<RoadmapItem>,
}
