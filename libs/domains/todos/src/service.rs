use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::clock::{Clock, SystemClock};
use crate::error::{TodoError, TodoResult};
use crate::models::{Filter, NewTodo, Priority, SortBy, Theme, Todo, TodoId, TodoPatch, ViewState};
use crate::repository::TodoRepository;
use crate::view::{derive_view, recent_todos, DashboardStats};

/// Dashboard aggregates plus the most recently created todos
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent: Vec<Todo>,
}

/// Service layer for todo business logic
#[derive(Clone)]
pub struct TodoService<R: TodoRepository> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repository: R) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: R, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository: Arc::new(repository),
            clock,
        }
    }

    /// Create a new todo with validation
    #[instrument(skip(self, input), fields(todo_title = %input.title))]
    pub async fn create_todo(&self, input: NewTodo) -> TodoResult<Todo> {
        let input = input.normalized();
        input.validate()?;

        if let Some(due) = input.due_date
            && due < self.clock.now()
        {
            return Err(TodoError::Validation(
                "Due date cannot be in the past".to_string(),
            ));
        }

        self.repository.create(input).await
    }

    /// Merge a partial update. `Ok(None)` if the id is unknown.
    #[instrument(skip(self, patch), fields(todo_id = %id))]
    pub async fn update_todo(&self, id: &TodoId, patch: TodoPatch) -> TodoResult<Option<Todo>> {
        let patch = patch.normalized();
        patch.validate()?;

        if patch.is_empty() {
            return self.repository.get(id).await;
        }

        self.repository.update(id, patch).await
    }

    #[instrument(skip(self), fields(todo_id = %id))]
    pub async fn toggle_todo(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        self.repository.toggle(id).await
    }

    /// Delete a todo. `false` if it was already gone.
    #[instrument(skip(self), fields(todo_id = %id))]
    pub async fn delete_todo(&self, id: &TodoId) -> TodoResult<bool> {
        self.repository.delete(id).await
    }

    pub async fn get_todo(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        self.repository.get(id).await
    }

    pub async fn list_todos(&self) -> TodoResult<Vec<Todo>> {
        self.repository.list().await
    }

    pub async fn todos_by_category(&self, category: &str) -> TodoResult<Vec<Todo>> {
        self.repository.by_category(category.trim()).await
    }

    pub async fn todos_by_priority(&self, priority: Priority) -> TodoResult<Vec<Todo>> {
        self.repository.by_priority(priority).await
    }

    pub async fn todos_due_before(&self, before: DateTime<Utc>) -> TodoResult<Vec<Todo>> {
        self.repository.due_before(before).await
    }

    pub async fn view_state(&self) -> TodoResult<ViewState> {
        self.repository.view_state().await
    }

    pub async fn set_filter(&self, filter: Filter) -> TodoResult<ViewState> {
        self.update_view(|view| view.filter = filter).await
    }

    pub async fn set_sort_by(&self, sort_by: SortBy) -> TodoResult<ViewState> {
        self.update_view(|view| view.sort_by = sort_by).await
    }

    pub async fn set_search_query(&self, query: &str) -> TodoResult<ViewState> {
        let query = query.to_string();
        self.update_view(move |view| view.search_query = query).await
    }

    /// Switch between light and dark, returning the new theme
    pub async fn toggle_theme(&self) -> TodoResult<Theme> {
        let view = self
            .update_view(|view| view.theme = view.theme.toggled())
            .await?;
        Ok(view.theme)
    }

    /// The list as it should be rendered under the current view state
    #[instrument(skip(self))]
    pub async fn visible_todos(&self) -> TodoResult<Vec<Todo>> {
        let todos = self.repository.list().await?;
        let view = self.repository.view_state().await?;
        Ok(derive_view(&todos, &view))
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self, recent_limit: usize) -> TodoResult<Dashboard> {
        let todos = self.repository.list().await?;
        Ok(Dashboard {
            stats: DashboardStats::from_todos(&todos),
            recent: recent_todos(&todos, recent_limit),
        })
    }

    async fn update_view(&self, apply: impl FnOnce(&mut ViewState)) -> TodoResult<ViewState> {
        let mut view = self.repository.view_state().await?;
        apply(&mut view);
        self.repository.save_view_state(view.clone()).await?;
        Ok(view)
    }
}
