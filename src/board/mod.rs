//! The board controller: initial load and optimistic mutation.
//!
//! Every write follows the same protocol:
//! 1. Capture the current value, then apply the change to local state.
//! 2. Persist it with a single-row request.
//! 3. On failure, re-apply the captured value and record a [`MutationFailure`].
//!
//! There is no queue and no coalescing. Concurrent edits of one field each send
//! their own request and whichever response lands last wins.

mod state;

pub use state::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use uuid::Uuid;

use crate::models::*;
use crate::store::{RoadmapStore, StoreError};

#[derive(Debug, Error)]
pub enum BoardError {
    /// One of the initial fetches failed; the board is in the error state.
    #[error("{0}")]
    Load(StoreError),

    /// A write was rejected and any local change rolled back.
    #[error("{message}")]
    Mutation {
        item_id: Option<Uuid>,
        field: Option<ItemField>,
        message: String,
    },

    #[error("Unknown roadmap item {0}")]
    UnknownItem(Uuid),

    #[error("Title cannot be empty")]
    EmptyTitle,
}

/// Result of a field edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Persisted,
    /// The item already held this value; nothing was sent.
    Unchanged,
}

/// Result of dropping an item on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Moved,
    Unchanged,
    /// The target is not a sprint. The item stays where it was.
    Ignored,
}

/// Board controller over a [`RoadmapStore`].
///
/// Cloning shares the same state, so handles can be passed to concurrent tasks.
pub struct Board<S> {
    store: Arc<S>,
    state: Arc<Mutex<BoardState>>,
    attached: Arc<AtomicBool>,
}

impl<S> Clone for Board<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            state: self.state.clone(),
            attached: self.attached.clone(),
        }
    }
}

impl<S: RoadmapStore> Board<S> {
    pub fn new(store: S) -> Self {
        Self::with_state(store, BoardState::new())
    }

    pub fn with_state(store: S, state: BoardState) -> Self {
        Self {
            store: Arc::new(store),
            state: Arc::new(Mutex::new(state)),
            attached: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().expect("board state lock poisoned")
    }

    /// Run `f` against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&BoardState) -> R) -> R {
        f(&self.lock())
    }

    /// Run `f` against the state mutably, e.g. to change filters.
    pub fn update<R>(&self, f: impl FnOnce(&mut BoardState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> BoardState {
        self.lock().clone()
    }

    /// Stop applying responses. Requests already in flight still complete, but
    /// their results (including rollbacks) are dropped.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    // ============================================================
    // Load
    // ============================================================

    /// Fetch all five collections and replace local state.
    ///
    /// Any single failure aborts the load: the state moves to
    /// [`LoadPhase::Failed`] and nothing fetched is kept.
    pub async fn load(&self) -> Result<(), BoardError> {
        self.lock().begin_loading();
        tracing::info!("Loading roadmap");

        let result = tokio::try_join!(
            self.store.list_teams(),
            self.store.list_super_domains(),
            self.store.list_domains(),
            self.store.list_sprints(),
            self.store.list_items(),
        );

        if !self.is_attached() {
            tracing::debug!("Board detached, dropping load result");
            return Ok(());
        }

        match result {
            Ok((teams, super_domains, domains, sprints, items)) => {
                tracing::info!(
                    "Loaded {} teams, {} domains, {} sprints, {} items",
                    teams.len(),
                    domains.len(),
                    sprints.len(),
                    items.len()
                );
                self.lock().load(BoardData {
                    teams,
                    super_domains,
                    domains,
                    sprints,
                    items,
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load roadmap: {}", e);
                self.lock().fail_loading(e.to_string());
                Err(BoardError::Load(e))
            }
        }
    }

    /// Re-run the whole load.
    pub async fn retry_load(&self) -> Result<(), BoardError> {
        self.load().await
    }

    // ============================================================
    // Field edits
    // ============================================================

    /// Optimistically change one field of an item and persist it.
    pub async fn edit_item(&self, item_id: Uuid, edit: ItemEdit) -> Result<EditOutcome, BoardError> {
        let edit = normalize(edit)?;
        let field = edit.field();

        let previous = {
            let mut state = self.lock();
            let current = state
                .item(item_id)
                .ok_or(BoardError::UnknownItem(item_id))?
                .current_value(field);
            if current == edit {
                return Ok(EditOutcome::Unchanged);
            }
            state
                .apply_edit(item_id, edit.clone())
                .ok_or(BoardError::UnknownItem(item_id))?
        };

        match self.store.update_item(item_id, &edit).await {
            Ok(()) => {
                tracing::debug!("Persisted {} on item {}", field, item_id);
                Ok(EditOutcome::Persisted)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("Rolling back {} on item {}: {}", field, item_id, message);
                if self.is_attached() {
                    let mut state = self.lock();
                    state.apply_edit(item_id, previous);
                    state.record_failure(MutationFailure {
                        operation: FailedOperation::Edit { item_id, edit },
                        message: message.clone(),
                    });
                }
                Err(BoardError::Mutation {
                    item_id: Some(item_id),
                    field: Some(field),
                    message,
                })
            }
        }
    }

    pub async fn edit_title(&self, item_id: Uuid, title: impl Into<String>) -> Result<EditOutcome, BoardError> {
        self.edit_item(item_id, ItemEdit::Title(title.into())).await
    }

    pub async fn edit_description(
        &self,
        item_id: Uuid,
        description: impl Into<String>,
    ) -> Result<EditOutcome, BoardError> {
        self.edit_item(item_id, ItemEdit::Description(description.into())).await
    }

    pub async fn edit_domain(&self, item_id: Uuid, domain_id: Uuid) -> Result<EditOutcome, BoardError> {
        self.edit_item(item_id, ItemEdit::DomainId(Some(domain_id))).await
    }

    pub async fn edit_priority(&self, item_id: Uuid, priority: Priority) -> Result<EditOutcome, BoardError> {
        self.edit_item(item_id, ItemEdit::Priority(priority)).await
    }

    pub async fn edit_effort(&self, item_id: Uuid, effort: Effort) -> Result<EditOutcome, BoardError> {
        self.edit_item(item_id, ItemEdit::Effort(effort)).await
    }

    pub async fn edit_status(&self, item_id: Uuid, status: ItemStatus) -> Result<EditOutcome, BoardError> {
        self.edit_item(item_id, ItemEdit::Status(status)).await
    }

    pub async fn edit_due_date(
        &self,
        item_id: Uuid,
        due_date: Option<chrono::NaiveDate>,
    ) -> Result<EditOutcome, BoardError> {
        self.edit_item(item_id, ItemEdit::DueDate(due_date)).await
    }

    // ============================================================
    // Sprint assignment
    // ============================================================

    /// Handle a drag-and-drop of `item_id` onto the drop target `target`.
    ///
    /// Only a target naming a loaded sprint reassigns the item. Anything else,
    /// including another item's id, is ignored.
    pub async fn drop_item(&self, item_id: Uuid, target: &str) -> Result<DropOutcome, BoardError> {
        let sprint_id = Uuid::parse_str(target)
            .ok()
            .filter(|id| self.read(|state| state.is_sprint(*id)));

        let Some(sprint_id) = sprint_id else {
            tracing::debug!("Ignoring drop of item {} on non-sprint target {}", item_id, target);
            return Ok(DropOutcome::Ignored);
        };

        match self.edit_item(item_id, ItemEdit::SprintId(Some(sprint_id))).await? {
            EditOutcome::Persisted => Ok(DropOutcome::Moved),
            EditOutcome::Unchanged => Ok(DropOutcome::Unchanged),
        }
    }

    /// Take an item out of its sprint and persist `sprint_id = null`.
    pub async fn move_to_backlog(&self, item_id: Uuid) -> Result<EditOutcome, BoardError> {
        self.edit_item(item_id, ItemEdit::SprintId(None)).await
    }

    // ============================================================
    // Create / delete
    // ============================================================

    /// Insert a new item and append the stored row locally.
    pub async fn add_item(&self, mut input: NewRoadmapItem) -> Result<RoadmapItem, BoardError> {
        input.title = input.title.trim().to_string();
        if input.title.is_empty() {
            return Err(BoardError::EmptyTitle);
        }

        match self.store.insert_item(&input).await {
            Ok(item) => {
                tracing::info!("Created item {} '{}'", item.id, item.title);
                if self.is_attached() {
                    self.lock().push_item(item.clone());
                }
                Ok(item)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("Failed to create item '{}': {}", input.title, message);
                if self.is_attached() {
                    self.lock().record_failure(MutationFailure {
                        operation: FailedOperation::Insert(input),
                        message: message.clone(),
                    });
                }
                Err(BoardError::Mutation {
                    item_id: None,
                    field: None,
                    message,
                })
            }
        }
    }

    /// Optimistically remove an item; it is restored in place if the delete fails.
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), BoardError> {
        let (index, removed) = self
            .lock()
            .remove_item(item_id)
            .ok_or(BoardError::UnknownItem(item_id))?;

        match self.store.delete_item(item_id).await {
            Ok(()) => {
                tracing::info!("Deleted item {}", item_id);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("Restoring item {} after failed delete: {}", item_id, message);
                if self.is_attached() {
                    let mut state = self.lock();
                    state.restore_item(index, removed);
                    state.record_failure(MutationFailure {
                        operation: FailedOperation::Delete { item_id },
                        message: message.clone(),
                    });
                }
                Err(BoardError::Mutation {
                    item_id: Some(item_id),
                    field: None,
                    message,
                })
            }
        }
    }

    // ============================================================
    // Failure handling
    // ============================================================

    /// Re-issue the last failed write. Returns `false` if there is none.
    pub async fn retry_failed(&self) -> Result<bool, BoardError> {
        let Some(failure) = self.read(|state| state.failure().cloned()) else {
            return Ok(false);
        };
        tracing::info!("Retrying failed write: {}", failure.message);
        self.dismiss_error();

        match failure.operation {
            FailedOperation::Edit { item_id, edit } => {
                self.edit_item(item_id, edit).await?;
            }
            FailedOperation::Insert(input) => {
                self.add_item(input).await?;
            }
            FailedOperation::Delete { item_id } => {
                self.delete_item(item_id).await?;
            }
        }
        Ok(true)
    }

    pub fn dismiss_error(&self) {
        self.lock().clear_failure();
    }
}

/// Trim titles and reject blank ones before anything is applied.
fn normalize(edit: ItemEdit) -> Result<ItemEdit, BoardError> {
    match edit {
        ItemEdit::Title(title) => {
            let title = title.trim();
            if title.is_empty() {
                Err(BoardError::EmptyTitle)
            } else {
                Ok(ItemEdit::Title(title.to_string()))
            }
        }
        other => Ok(other),
    }
}
