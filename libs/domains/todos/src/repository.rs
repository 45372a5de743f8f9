use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::TodoResult;
use crate::models::{NewTodo, Priority, Todo, TodoId, TodoPatch, ViewState};

/// Repository trait for todo persistence
///
/// One interface over both backends: the persisted local store and the
/// remote HTTP API. Mutations on an unknown id are no-ops reported through
/// the return value (`None` / `false`), never as errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// All todos, in backend order
    async fn list(&self) -> TodoResult<Vec<Todo>>;

    /// Get a todo by ID
    async fn get(&self, id: &TodoId) -> TodoResult<Option<Todo>>;

    /// Create a todo; the returned record is authoritative
    async fn create(&self, input: NewTodo) -> TodoResult<Todo>;

    /// Merge a partial update
    async fn update(&self, id: &TodoId, patch: TodoPatch) -> TodoResult<Option<Todo>>;

    /// Flip completion
    async fn toggle(&self, id: &TodoId) -> TodoResult<Option<Todo>>;

    /// Delete a todo, returning whether it existed
    async fn delete(&self, id: &TodoId) -> TodoResult<bool>;

    async fn by_category(&self, category: &str) -> TodoResult<Vec<Todo>>;

    async fn by_priority(&self, priority: Priority) -> TodoResult<Vec<Todo>>;

    /// Todos whose due date is strictly before `before`
    async fn due_before(&self, before: DateTime<Utc>) -> TodoResult<Vec<Todo>>;

    /// Current filter / sort / search / theme
    async fn view_state(&self) -> TodoResult<ViewState>;

    async fn save_view_state(&self, view: ViewState) -> TodoResult<()>;
}

#[async_trait]
impl<R: TodoRepository + ?Sized> TodoRepository for Box<R> {
    async fn list(&self) -> TodoResult<Vec<Todo>> {
        (**self).list().await
    }

    async fn get(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        (**self).get(id).await
    }

    async fn create(&self, input: NewTodo) -> TodoResult<Todo> {
        (**self).create(input).await
    }

    async fn update(&self, id: &TodoId, patch: TodoPatch) -> TodoResult<Option<Todo>> {
        (**self).update(id, patch).await
    }

    async fn toggle(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        (**self).toggle(id).await
    }

    async fn delete(&self, id: &TodoId) -> TodoResult<bool> {
        (**self).delete(id).await
    }

    async fn by_category(&self, category: &str) -> TodoResult<Vec<Todo>> {
        (**self).by_category(category).await
    }

    async fn by_priority(&self, priority: Priority) -> TodoResult<Vec<Todo>> {
        (**self).by_priority(priority).await
    }

    async fn due_before(&self, before: DateTime<Utc>) -> TodoResult<Vec<Todo>> {
        (**self).due_before(before).await
    }

    async fn view_state(&self) -> TodoResult<ViewState> {
        (**self).view_state().await
    }

    async fn save_view_state(&self, view: ViewState) -> TodoResult<()> {
        (**self).save_view_state(view).await
    }
}
