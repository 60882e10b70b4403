use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{Database, OrderBy};
use crate::models::*;
use crate::store::Table;

// ============================================================
// Error Handling
// ============================================================

/// Error body in the backend's format. Clients display `message` verbatim.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    pub details: Option<String>,
    pub hint: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
            code: code.to_string(),
            details: None,
            hint: None,
        }),
    )
}

/// Log an internal error and return a generic message.
///
/// Constraint violations are the client's fault and are passed through as 400s.
fn internal_error(e: anyhow::Error) -> ApiError {
    if let Some(rusqlite::Error::SqliteFailure(failure, message)) =
        e.downcast_ref::<rusqlite::Error>()
    {
        if failure.code == rusqlite::ffi::ErrorCode::ConstraintViolation {
            let message = message.clone().unwrap_or_else(|| failure.to_string());
            tracing::warn!("Constraint violation: {}", message);
            return api_error(StatusCode::BAD_REQUEST, "23514", message);
        }
    }

    tracing::error!("Internal error: {:#}", e);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "XX000",
        "Internal server error",
    )
}

fn table_from_path(name: &str) -> Result<Table, ApiError> {
    Table::from_name(name).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "PGRST205",
            format!("Could not find the table 'public.{}' in the schema cache", name),
        )
    })
}

/// Only roadmap items are writable.
fn writable_table(name: &str) -> Result<(), ApiError> {
    match table_from_path(name)? {
        Table::RoadmapItems => Ok(()),
        other => Err(api_error(
            StatusCode::METHOD_NOT_ALLOWED,
            "PGRST105",
            format!("Table '{}' is read-only", other.name()),
        )),
    }
}

/// Extract the row id from an `id=eq.<uuid>` filter.
fn id_filter(query: &HashMap<String, String>) -> Result<Uuid, ApiError> {
    let filter = query.get("id").ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "PGRST100",
            "Writes require an id=eq.<uuid> filter",
        )
    })?;

    filter
        .strip_prefix("eq.")
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                "PGRST100",
                format!("Invalid id filter '{}'", filter),
            )
        })
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Rows
// ============================================================

pub async fn list_rows(
    State(db): State<Database>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let table = table_from_path(&table)?;
    let order = match query.get("order") {
        Some(spec) => OrderBy::parse(table, spec).ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                "PGRST100",
                format!("Cannot order {} by '{}'", table.name(), spec),
            )
        })?,
        None => OrderBy::default_for(table),
    };

    let rows = match table {
        Table::Teams => db.list_teams(order).and_then(to_json),
        Table::SuperDomains => db.list_super_domains(order).and_then(to_json),
        Table::Domains => db.list_domains(order).and_then(to_json),
        Table::Sprints => db.list_sprints(order).and_then(to_json),
        Table::RoadmapItems => db.list_items(order).and_then(to_json),
    };

    rows.map(Json).map_err(internal_error)
}

fn to_json<T: Serialize>(rows: Vec<T>) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::to_value(rows)?)
}

pub async fn insert_row(
    State(db): State<Database>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(input): Json<NewRoadmapItem>,
) -> Result<Response, ApiError> {
    writable_table(&table)?;

    if input.title.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "23502",
            "Title cannot be empty",
        ));
    }

    let item = db.create_item(&input).map_err(internal_error)?;
    tracing::debug!("Inserted roadmap item {}", item.id);

    let wants_row = headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("return=representation"));

    if wants_row {
        Ok((StatusCode::CREATED, Json(vec![item])).into_response())
    } else {
        Ok(StatusCode::CREATED.into_response())
    }
}

/// Single-column update. Matching no row is not an error.
pub async fn update_row(
    State(db): State<Database>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<serde_json::Value>,
) -> Result<StatusCode, ApiError> {
    writable_table(&table)?;
    let id = id_filter(&query)?;

    let edit: ItemEdit = serde_json::from_value(body).map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            "PGRST204",
            format!("Invalid update body: {}", e),
        )
    })?;

    if let ItemEdit::Title(title) = &edit {
        if title.trim().is_empty() {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "23502",
                "Title cannot be empty",
            ));
        }
    }

    match db.update_item(id, &edit).map_err(internal_error)? {
        Some(_) => tracing::debug!("Updated {} on roadmap item {}", edit.field(), id),
        None => tracing::debug!("Update matched no roadmap item {}", id),
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_row(
    State(db): State<Database>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<StatusCode, ApiError> {
    writable_table(&table)?;
    let id = id_filter(&query)?;

    if !db.delete_item(id).map_err(internal_error)? {
        tracing::debug!("Delete matched no roadmap item {}", id);
    }
    Ok(StatusCode::NO_CONTENT)
}
