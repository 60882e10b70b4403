//! HTTP client for the hosted table backend.
//!
//! Speaks the PostgREST dialect the hosted backend exposes under `/rest/v1`:
//! - `GET /rest/v1/{table}?select=*&order={column}`
//! - `POST /rest/v1/roadmap_items` with `Prefer: return=representation`
//! - `PATCH /rest/v1/roadmap_items?id=eq.{id}` with a single-column body
//! - `DELETE /rest/v1/roadmap_items?id=eq.{id}`
//!
//! The anon key is sent both as the `apikey` header and as a bearer token.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use super::{RoadmapStore, StoreError, Table};
use crate::config::BoardConfig;
use crate::models::*;

const REST_PREFIX: &str = "/rest/v1";

/// Error body returned by the backend on failure.
#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    message: String,
}

/// HTTP client for the hosted backend.
#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl RestStore {
    /// Create with explicit configuration. `base_url` is the project URL without
    /// the `/rest/v1` suffix.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(config.backend_url.clone(), config.anon_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with the key headers attached.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}{}", self.base_url, REST_PREFIX, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }
        req
    }

    /// Fetch every row of `table`, ordered by its default column.
    async fn fetch_all<T: DeserializeOwned>(&self, table: Table) -> Result<Vec<T>, StoreError> {
        tracing::debug!("Fetching {} ordered by {}", table.name(), table.default_order());
        let response = self
            .request(Method::GET, &format!("/{}", table.name()))
            .query(&[("select", "*"), ("order", table.default_order())])
            .send()
            .await?;
        handle_response(response).await
    }
}

/// Handle response, converting HTTP errors to StoreError.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json().await?)
    } else {
        Err(error_from_response(status, response).await)
    }
}

/// Handle response that may return empty body (204 No Content).
async fn handle_empty_response(response: reqwest::Response) -> Result<(), StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(error_from_response(status, response).await)
    }
}

async fn error_from_response(status: StatusCode, response: reqwest::Response) -> StoreError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BackendErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        _ => StoreError::Backend {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl RoadmapStore for RestStore {
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        self.fetch_all(Table::Teams).await
    }

    async fn list_super_domains(&self) -> Result<Vec<SuperDomain>, StoreError> {
        self.fetch_all(Table::SuperDomains).await
    }

    async fn list_domains(&self) -> Result<Vec<Domain>, StoreError> {
        self.fetch_all(Table::Domains).await
    }

    async fn list_sprints(&self) -> Result<Vec<Sprint>, StoreError> {
        self.fetch_all(Table::Sprints).await
    }

    async fn list_items(&self) -> Result<Vec<RoadmapItem>, StoreError> {
        self.fetch_all(Table::RoadmapItems).await
    }

    async fn insert_item(&self, input: &NewRoadmapItem) -> Result<RoadmapItem, StoreError> {
        let response = self
            .request(Method::POST, &format!("/{}", Table::RoadmapItems.name()))
            .header("Prefer", "return=representation")
            .json(input)
            .send()
            .await?;
        let rows: Vec<RoadmapItem> = handle_response(response).await?;
        rows.into_iter().next().ok_or_else(|| StoreError::Backend {
            status: StatusCode::OK.as_u16(),
            message: "Insert returned no row".to_string(),
        })
    }

    async fn update_item(&self, id: Uuid, edit: &ItemEdit) -> Result<(), StoreError> {
        tracing::debug!("Updating {} on item {}", edit.field(), id);
        let response = self
            .request(Method::PATCH, &format!("/{}", Table::RoadmapItems.name()))
            .query(&[("id", format!("eq.{}", id))])
            .json(edit)
            .send()
            .await?;
        handle_empty_response(response).await
    }

    async fn delete_item(&self, id: Uuid) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, &format!("/{}", Table::RoadmapItems.name()))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;
        handle_empty_response(response).await
    }
}
