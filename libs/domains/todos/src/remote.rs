use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::client::TodoApiClient;
use crate::clock::{Clock, SystemClock};
use crate::error::{TodoError, TodoResult};
use crate::models::{NewTodo, Priority, Todo, TodoId, TodoPatch, ViewState};
use crate::repository::TodoRepository;
use crate::storage::SnapshotStorage;
use crate::store::{load_view_state, save_view_state};

/// Repository backed by the remote API with an in-memory cache.
///
/// `list` refreshes the cache from the server. Mutations merge the record the
/// server returns instead of reloading the whole collection. The server does
/// not own view state, so it is kept in local storage under
/// [`VIEW_STORAGE_KEY`](crate::store::VIEW_STORAGE_KEY).
pub struct RemoteTodoRepository<S: SnapshotStorage> {
    client: TodoApiClient,
    clock: Arc<dyn Clock>,
    storage: S,
    cache: RwLock<Vec<Todo>>,
    view: RwLock<ViewState>,
}

impl<S: SnapshotStorage> RemoteTodoRepository<S> {
    /// Restore the saved view state and start with an empty cache
    pub fn new(client: TodoApiClient, storage: S) -> TodoResult<Self> {
        Self::with_clock(client, storage, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: TodoApiClient,
        storage: S,
        clock: Arc<dyn Clock>,
    ) -> TodoResult<Self> {
        let view = load_view_state(&storage)?;
        Ok(Self {
            client,
            clock,
            storage,
            cache: RwLock::new(Vec::new()),
            view: RwLock::new(view),
        })
    }

    pub fn client(&self) -> &TodoApiClient {
        &self.client
    }

    /// Snapshot of what the cache currently holds
    pub async fn cached(&self) -> Vec<Todo> {
        self.cache.read().await.clone()
    }

    async fn merge(&self, todo: &Todo) {
        let mut cache = self.cache.write().await;
        match cache.iter_mut().find(|t| t.id == todo.id) {
            Some(slot) => *slot = todo.clone(),
            None => cache.push(todo.clone()),
        }
    }

    async fn evict(&self, id: &TodoId) {
        self.cache.write().await.retain(|t| &t.id != id);
    }

    // Cached copy, or the server's when the cache has never seen it
    async fn current(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        if let Some(todo) = self.cache.read().await.iter().find(|t| &t.id == id) {
            return Ok(Some(todo.clone()));
        }

        let fetched = self.client.get_todo(id).await?;
        if let Some(todo) = &fetched {
            self.merge(todo).await;
        }
        Ok(fetched)
    }

    // PUT the locally edited record and merge the server's answer
    async fn replace(&self, id: &TodoId, next: Todo) -> TodoResult<Option<Todo>> {
        match self.client.update_todo(id, &next).await {
            Ok(stored) => {
                self.merge(&stored).await;
                Ok(Some(stored))
            }
            Err(TodoError::NotFound(_)) => {
                debug!(todo_id = %id, "Todo vanished on the server");
                self.evict(id).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn merge_all(&self, todos: &[Todo]) {
        for todo in todos {
            self.merge(todo).await;
        }
    }
}

#[async_trait]
impl<S: SnapshotStorage> TodoRepository for RemoteTodoRepository<S> {
    #[instrument(skip(self))]
    async fn list(&self) -> TodoResult<Vec<Todo>> {
        let todos = self.client.get_all_todos().await?;
        *self.cache.write().await = todos.clone();
        Ok(todos)
    }

    async fn get(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        self.current(id).await
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    async fn create(&self, input: NewTodo) -> TodoResult<Todo> {
        let todo = self.client.create_todo(&input).await?;
        self.merge(&todo).await;
        tracing::info!(todo_id = %todo.id, "Created todo");
        Ok(todo)
    }

    #[instrument(skip(self, patch), fields(todo_id = %id))]
    async fn update(&self, id: &TodoId, patch: TodoPatch) -> TodoResult<Option<Todo>> {
        let Some(mut next) = self.current(id).await? else {
            return Ok(None);
        };
        next.apply_patch(patch, self.clock.now());
        self.replace(id, next).await
    }

    #[instrument(skip(self), fields(todo_id = %id))]
    async fn toggle(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        let Some(mut next) = self.current(id).await? else {
            return Ok(None);
        };
        next.toggle(self.clock.now());
        self.replace(id, next).await
    }

    #[instrument(skip(self), fields(todo_id = %id))]
    async fn delete(&self, id: &TodoId) -> TodoResult<bool> {
        let deleted = match self.client.delete_todo(id).await {
            Ok(()) => true,
            Err(TodoError::NotFound(_)) => false,
            Err(e) => return Err(e),
        };
        self.evict(id).await;
        if deleted {
            tracing::info!(todo_id = %id, "Deleted todo");
        }
        Ok(deleted)
    }

    async fn by_category(&self, category: &str) -> TodoResult<Vec<Todo>> {
        let todos = self.client.get_by_category(category).await?;
        self.merge_all(&todos).await;
        Ok(todos)
    }

    async fn by_priority(&self, priority: Priority) -> TodoResult<Vec<Todo>> {
        let todos = self.client.get_by_priority(priority).await?;
        self.merge_all(&todos).await;
        Ok(todos)
    }

    async fn due_before(&self, before: DateTime<Utc>) -> TodoResult<Vec<Todo>> {
        let todos = self.client.get_due_before(before).await?;
        self.merge_all(&todos).await;
        Ok(todos)
    }

    async fn view_state(&self) -> TodoResult<ViewState> {
        Ok(self.view.read().await.clone())
    }

    async fn save_view_state(&self, view: ViewState) -> TodoResult<()> {
        let mut current = self.view.write().await;
        *current = view;
        save_view_state(&self.storage, &current)
    }
}
