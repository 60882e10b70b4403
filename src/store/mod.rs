//! The remote table store the board reads from and writes to.
//!
//! [`RoadmapStore`] is the seam between the board and whatever hosts the five
//! tables. [`RestStore`] talks to the hosted backend over its REST dialect;
//! [`crate::db::Database`] implements the same trait over a local SQLite file.

mod rest;

pub use rest::RestStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

/// Store failures. Backend messages are kept verbatim for display.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Local(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        Self::Local(format!("{:#}", e))
    }
}

/// The five tables the board reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Teams,
    SuperDomains,
    Domains,
    Sprints,
    RoadmapItems,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Teams,
        Table::SuperDomains,
        Table::Domains,
        Table::Sprints,
        Table::RoadmapItems,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Teams => "teams",
            Self::SuperDomains => "super_domains",
            Self::Domains => "domains",
            Self::Sprints => "sprints",
            Self::RoadmapItems => "roadmap_items",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == s)
    }

    /// Column the board orders this table by when loading.
    pub fn default_order(&self) -> &'static str {
        match self {
            Self::Teams | Self::SuperDomains | Self::Domains => "name",
            Self::Sprints => "start_date",
            Self::RoadmapItems => "created_at",
        }
    }

    /// Columns a fetch may be ordered by.
    pub fn orderable_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Teams | Self::SuperDomains => &["id", "name"],
            Self::Domains => &["id", "name", "super_domain_id"],
            Self::Sprints => &["id", "name", "start_date", "end_date", "status"],
            Self::RoadmapItems => &[
                "id",
                "title",
                "status",
                "priority",
                "effort",
                "due_date",
                "created_at",
                "updated_at",
            ],
        }
    }
}

/// Read-all and single-row write access to the roadmap tables.
///
/// Every call may fail with a backend-reported error; callers treat any failure
/// as "operation failed" and show the message as-is.
#[async_trait]
pub trait RoadmapStore: Send + Sync {
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError>;

    async fn list_super_domains(&self) -> Result<Vec<SuperDomain>, StoreError>;

    async fn list_domains(&self) -> Result<Vec<Domain>, StoreError>;

    async fn list_sprints(&self) -> Result<Vec<Sprint>, StoreError>;

    async fn list_items(&self) -> Result<Vec<RoadmapItem>, StoreError>;

    /// Insert one item and return the row as stored.
    async fn insert_item(&self, input: &NewRoadmapItem) -> Result<RoadmapItem, StoreError>;

    /// Update a single field of the item with primary key `id`.
    async fn update_item(&self, id: Uuid, edit: &ItemEdit) -> Result<(), StoreError>;

    async fn delete_item(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: RoadmapStore + ?Sized> RoadmapStore for std::sync::Arc<S> {
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        (**self).list_teams().await
    }

    async fn list_super_domains(&self) -> Result<Vec<SuperDomain>, StoreError> {
        (**self).list_super_domains().await
    }

    async fn list_domains(&self) -> Result<Vec<Domain>, StoreError> {
        (**self).list_domains().await
    }

    async fn list_sprints(&self) -> Result<Vec<Sprint>, StoreError> {
        (**self).list_sprints().await
    }

    async fn list_items(&self) -> Result<Vec<RoadmapItem>, StoreError> {
        (**self).list_items().await
    }

    async fn insert_item(&self, input: &NewRoadmapItem) -> Result<RoadmapItem, StoreError> {
        (**self).insert_item(input).await
    }

    async fn update_item(&self, id: Uuid, edit: &ItemEdit) -> Result<(), StoreError> {
        (**self).update_item(id, edit).await
    }

    async fn delete_item(&self, id: Uuid) -> Result<(), StoreError> {
        (**self).delete_item(id).await
    }
}
