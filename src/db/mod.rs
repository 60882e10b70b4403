//! Local SQLite copy of the roadmap tables.
//!
//! Backs `roadmap serve`, which exposes the same REST dialect as the hosted
//! backend, and doubles as an in-process [`RoadmapStore`].

mod schema;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::models::*;
use crate::store::{RoadmapStore, StoreError, Table};

const DATE_FORMAT: &str = "%Y-%m-%d";

const ITEM_COLUMNS: &str = "id, title, description, status, priority, effort, due_date,
     team_id, domain_id, sprint_id, created_at, updated_at";

/// A validated `ORDER BY` for one table, parsed from `col`, `col.asc` or `col.desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    column: &'static str,
    descending: bool,
}

impl OrderBy {
    pub fn parse(table: Table, spec: &str) -> Option<Self> {
        let (column, descending) = match spec.rsplit_once('.') {
            Some((column, "asc")) => (column, false),
            Some((column, "desc")) => (column, true),
            Some(_) => return None,
            None => (spec, false),
        };
        let column = table
            .orderable_columns()
            .iter()
            .copied()
            .find(|c| *c == column)?;
        Some(Self { column, descending })
    }

    pub fn default_for(table: Table) -> Self {
        Self {
            column: table.default_order(),
            descending: false,
        }
    }

    fn sql(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("ORDER BY {} {}", self.column, direction)
    }
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "roadmap-board")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("roadmap.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Reference tables
    // ============================================================

    pub fn list_teams(&self, order: OrderBy) -> Result<Vec<Team>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, description, color FROM teams {}",
            order.sql()
        ))?;

        let teams = stmt
            .query_map([], |row| {
                Ok(Team {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    color: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(teams)
    }

    pub fn list_super_domains(&self, order: OrderBy) -> Result<Vec<SuperDomain>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, description, color FROM super_domains {}",
            order.sql()
        ))?;

        let super_domains = stmt
            .query_map([], |row| {
                Ok(SuperDomain {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    color: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(super_domains)
    }

    pub fn list_domains(&self, order: OrderBy) -> Result<Vec<Domain>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, description, color, super_domain_id FROM domains {}",
            order.sql()
        ))?;

        let domains = stmt
            .query_map([], |row| {
                Ok(Domain {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    color: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    super_domain_id: parse_uuid(row.get::<_, String>(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(domains)
    }

    pub fn list_sprints(&self, order: OrderBy) -> Result<Vec<Sprint>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, start_date, end_date, status FROM sprints {}",
            order.sql()
        ))?;

        let sprints = stmt
            .query_map([], |row| {
                Ok(Sprint {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    start_date: parse_date(row.get::<_, String>(2)?).unwrap_or_default(),
                    end_date: parse_date(row.get::<_, String>(3)?).unwrap_or_default(),
                    status: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sprints)
    }

    // ============================================================
    // Roadmap item operations
    // ============================================================

    pub fn list_items(&self, order: OrderBy) -> Result<Vec<RoadmapItem>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM roadmap_items {}",
            ITEM_COLUMNS,
            order.sql()
        ))?;

        let items = stmt
            .query_map([], item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    pub fn get_item(&self, id: Uuid) -> Result<Option<RoadmapItem>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        select_item(&conn, id)
    }

    pub fn create_item(&self, input: &NewRoadmapItem) -> Result<RoadmapItem> {
        let now = Utc::now();
        let item = RoadmapItem {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status,
            priority: input.priority,
            effort: input.effort,
            due_date: input.due_date,
            team_id: input.team_id,
            domain_id: input.domain_id,
            sprint_id: input.sprint_id,
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        insert_item_row(&conn, &item)?;

        Ok(item)
    }

    /// Apply a single-field edit. Returns `None` if no item has this id.
    ///
    /// The read and the write happen under one lock so concurrent edits of
    /// different fields on the same row cannot overwrite each other.
    pub fn update_item(&self, id: Uuid, edit: &ItemEdit) -> Result<Option<RoadmapItem>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(mut item) = select_item(&conn, id)? else {
            return Ok(None);
        };

        edit.clone().apply_to(&mut item);
        item.updated_at = Utc::now();

        conn.execute(
            "UPDATE roadmap_items SET title = ?, description = ?, status = ?, priority = ?,
             effort = ?, due_date = ?, domain_id = ?, sprint_id = ?, updated_at = ?
             WHERE id = ?",
            (
                &item.title,
                &item.description,
                item.status.as_str(),
                item.priority.as_str(),
                item.effort.as_str(),
                item.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
                item.domain_id.map(|u| u.to_string()),
                item.sprint_id.map(|u| u.to_string()),
                item.updated_at.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Some(item))
    }

    pub fn delete_item(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM roadmap_items WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Seeding
    // ============================================================

    /// Write a whole data set in one transaction, overwriting rows with the same id.
    ///
    /// Parents are upserted rather than replaced so items keep their sprint.
    pub fn import(&self, data: &BoardData) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        for team in &data.teams {
            tx.execute(
                "INSERT INTO teams (id, name, description, color) VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name,
                 description = excluded.description, color = excluded.color",
                (team.id.to_string(), &team.name, &team.description, &team.color),
            )?;
        }
        for super_domain in &data.super_domains {
            tx.execute(
                "INSERT INTO super_domains (id, name, description, color) VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name,
                 description = excluded.description, color = excluded.color",
                (
                    super_domain.id.to_string(),
                    &super_domain.name,
                    &super_domain.description,
                    &super_domain.color,
                ),
            )?;
        }
        for domain in &data.domains {
            tx.execute(
                "INSERT INTO domains (id, name, description, color, super_domain_id)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name,
                 description = excluded.description, color = excluded.color,
                 super_domain_id = excluded.super_domain_id",
                (
                    domain.id.to_string(),
                    &domain.name,
                    &domain.description,
                    &domain.color,
                    domain.super_domain_id.to_string(),
                ),
            )?;
        }
        for sprint in &data.sprints {
            tx.execute(
                "INSERT INTO sprints (id, name, start_date, end_date, status) VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name,
                 start_date = excluded.start_date, end_date = excluded.end_date,
                 status = excluded.status",
                (
                    sprint.id.to_string(),
                    &sprint.name,
                    sprint.start_date.format(DATE_FORMAT).to_string(),
                    sprint.end_date.format(DATE_FORMAT).to_string(),
                    &sprint.status,
                ),
            )?;
        }
        for item in &data.items {
            tx.execute("DELETE FROM roadmap_items WHERE id = ?", [item.id.to_string()])?;
            insert_item_row(&tx, item)?;
        }

        tx.commit()?;
        tracing::info!(
            "Imported {} teams, {} domains, {} sprints, {} items",
            data.teams.len(),
            data.domains.len(),
            data.sprints.len(),
            data.items.len()
        );
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

#[async_trait]
impl RoadmapStore for Database {
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        Ok(Database::list_teams(self, OrderBy::default_for(Table::Teams))?)
    }

    async fn list_super_domains(&self) -> Result<Vec<SuperDomain>, StoreError> {
        Ok(Database::list_super_domains(
            self,
            OrderBy::default_for(Table::SuperDomains),
        )?)
    }

    async fn list_domains(&self) -> Result<Vec<Domain>, StoreError> {
        Ok(Database::list_domains(self, OrderBy::default_for(Table::Domains))?)
    }

    async fn list_sprints(&self) -> Result<Vec<Sprint>, StoreError> {
        Ok(Database::list_sprints(self, OrderBy::default_for(Table::Sprints))?)
    }

    async fn list_items(&self) -> Result<Vec<RoadmapItem>, StoreError> {
        Ok(Database::list_items(self, OrderBy::default_for(Table::RoadmapItems))?)
    }

    async fn insert_item(&self, input: &NewRoadmapItem) -> Result<RoadmapItem, StoreError> {
        Ok(self.create_item(input)?)
    }

    async fn update_item(&self, id: Uuid, edit: &ItemEdit) -> Result<(), StoreError> {
        Database::update_item(self, id, edit)?
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Roadmap item {} not found", id)))
    }

    async fn delete_item(&self, id: Uuid) -> Result<(), StoreError> {
        if Database::delete_item(self, id)? {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("Roadmap item {} not found", id)))
        }
    }
}

fn insert_item_row(conn: &Connection, item: &RoadmapItem) -> Result<()> {
    conn.execute(
        "INSERT INTO roadmap_items (id, title, description, status, priority, effort, due_date,
         team_id, domain_id, sprint_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            item.id.to_string(),
            &item.title,
            &item.description,
            item.status.as_str(),
            item.priority.as_str(),
            item.effort.as_str(),
            item.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
            item.team_id.map(|u| u.to_string()),
            item.domain_id.map(|u| u.to_string()),
            item.sprint_id.map(|u| u.to_string()),
            item.created_at.to_rfc3339(),
            item.updated_at.to_rfc3339(),
        ),
    )?;
    Ok(())
}

fn select_item(conn: &Connection, id: Uuid) -> Result<Option<RoadmapItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM roadmap_items WHERE id = ?",
        ITEM_COLUMNS
    ))?;

    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(item_from_row(row)?))
    } else {
        Ok(None)
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<RoadmapItem> {
    Ok(RoadmapItem {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        status: parse_or_default(row.get::<_, Option<String>>(3)?),
        priority: parse_or_default(row.get::<_, Option<String>>(4)?),
        effort: parse_or_default(row.get::<_, Option<String>>(5)?),
        due_date: row.get::<_, Option<String>>(6)?.and_then(parse_date),
        team_id: row.get::<_, Option<String>>(7)?.map(parse_uuid),
        domain_id: row.get::<_, Option<String>>(8)?.map(parse_uuid),
        sprint_id: row.get::<_, Option<String>>(9)?.map(parse_uuid),
        created_at: parse_datetime(row.get::<_, String>(10)?),
        updated_at: parse_datetime(row.get::<_, String>(11)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_date(s: String) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_or_default<T: FromStr + Default>(s: Option<String>) -> T {
    s.and_then(|s| s.parse().ok()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_parsing() {
        assert_eq!(
            OrderBy::parse(Table::Sprints, "start_date"),
            Some(OrderBy::default_for(Table::Sprints))
        );
        let desc = OrderBy::parse(Table::RoadmapItems, "created_at.desc").unwrap();
        assert_eq!(desc.sql(), "ORDER BY created_at DESC");
        assert!(OrderBy::parse(Table::Teams, "name; DROP TABLE teams").is_none());
        assert!(OrderBy::parse(Table::Teams, "name.sideways").is_none());
        assert!(OrderBy::parse(Table::Teams, "start_date").is_none());
    }

    #[test]
    fn test_unknown_enum_text_falls_back_to_default() {
        assert_eq!(parse_or_default::<Effort>(None), Effort::Medium);
        assert_eq!(
            parse_or_default::<Priority>(Some("urgent".to_string())),
            Priority::Medium
        );
        assert_eq!(
            parse_or_default::<ItemStatus>(Some("in-progress".to_string())),
            ItemStatus::InProgress
        );
    }
}
