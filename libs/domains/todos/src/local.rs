use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::TodoResult;
use crate::models::{NewTodo, Priority, Todo, TodoId, TodoPatch, ViewState};
use crate::repository::TodoRepository;
use crate::storage::SnapshotStorage;
use crate::store::TodoStore;

/// Repository backed by the persisted local store.
///
/// The store is single-writer; the mutex serializes concurrent callers.
pub struct LocalTodoRepository<S: SnapshotStorage> {
    store: Mutex<TodoStore<S>>,
}

impl<S: SnapshotStorage> LocalTodoRepository<S> {
    pub fn new(store: TodoStore<S>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Open the store on `storage` and wrap it
    pub fn open(storage: S) -> TodoResult<Self> {
        Ok(Self::new(TodoStore::open(storage)?))
    }
}

#[async_trait]
impl<S: SnapshotStorage> TodoRepository for LocalTodoRepository<S> {
    async fn list(&self) -> TodoResult<Vec<Todo>> {
        Ok(self.store.lock().await.todos().to_vec())
    }

    async fn get(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        Ok(self.store.lock().await.get(id).cloned())
    }

    async fn create(&self, input: NewTodo) -> TodoResult<Todo> {
        let todo = self.store.lock().await.add_todo(input)?;
        tracing::info!(todo_id = %todo.id, "Created todo");
        Ok(todo)
    }

    async fn update(&self, id: &TodoId, patch: TodoPatch) -> TodoResult<Option<Todo>> {
        self.store.lock().await.update_todo(id, patch)
    }

    async fn toggle(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        self.store.lock().await.toggle_todo(id)
    }

    async fn delete(&self, id: &TodoId) -> TodoResult<bool> {
        let deleted = self.store.lock().await.delete_todo(id)?;
        if deleted {
            tracing::info!(todo_id = %id, "Deleted todo");
        }
        Ok(deleted)
    }

    async fn by_category(&self, category: &str) -> TodoResult<Vec<Todo>> {
        let store = self.store.lock().await;
        Ok(store
            .todos()
            .iter()
            .filter(|t| t.category.as_deref() == Some(category))
            .cloned()
            .collect())
    }

    async fn by_priority(&self, priority: Priority) -> TodoResult<Vec<Todo>> {
        let store = self.store.lock().await;
        Ok(store
            .todos()
            .iter()
            .filter(|t| t.priority == priority)
            .cloned()
            .collect())
    }

    async fn due_before(&self, before: DateTime<Utc>) -> TodoResult<Vec<Todo>> {
        let store = self.store.lock().await;
        Ok(store
            .todos()
            .iter()
            .filter(|t| t.due_date.is_some_and(|due| due < before))
            .cloned()
            .collect())
    }

    async fn view_state(&self) -> TodoResult<ViewState> {
        Ok(self.store.lock().await.view_state().clone())
    }

    async fn save_view_state(&self, view: ViewState) -> TodoResult<()> {
        self.store.lock().await.set_view_state(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_get_todo() {
        let repo = LocalTodoRepository::open(MemoryStorage::new()).unwrap();

        let todo = repo.create(NewTodo::new("Water plants")).await.unwrap();
        let fetched = repo.get(&todo.id).await.unwrap();

        assert_eq!(fetched, Some(todo));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_in_process_queries() {
        let repo = LocalTodoRepository::open(MemoryStorage::new()).unwrap();
        let now = Utc::now();

        repo.create(NewTodo {
            title: "Taxes".into(),
            category: Some("finance".into()),
            priority: Priority::High,
            due_date: Some(now + Duration::days(1)),
            ..Default::default()
        })
        .await
        .unwrap();
        repo.create(NewTodo {
            title: "Gym".into(),
            category: Some("health".into()),
            priority: Priority::Low,
            due_date: Some(now + Duration::days(10)),
            ..Default::default()
        })
        .await
        .unwrap();
        repo.create(NewTodo::new("Someday")).await.unwrap();

        let finance = repo.by_category("finance").await.unwrap();
        assert_eq!(finance.len(), 1);
        assert_eq!(finance[0].title, "Taxes");

        let low = repo.by_priority(Priority::Low).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].title, "Gym");

        let due = repo.due_before(now + Duration::days(2)).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].title, "Taxes");
    }

    #[tokio::test]
    async fn test_view_state_is_persisted() {
        let storage = MemoryStorage::new();
        let repo = LocalTodoRepository::open(storage.clone()).unwrap();

        let view = ViewState {
            search_query: "tax".into(),
            ..Default::default()
        };
        repo.save_view_state(view.clone()).await.unwrap();

        let reopened = LocalTodoRepository::open(storage).unwrap();
        assert_eq!(reopened.view_state().await.unwrap(), view);
    }
}
