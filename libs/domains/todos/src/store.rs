//! Persisted local todo store.
//!
//! Holds the collection plus view state for one session. Every mutation
//! rewrites the whole snapshot under [`STORAGE_KEY`] so a restart picks up
//! exactly where the previous process left off.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::clock::{Clock, SystemClock};
use crate::error::TodoResult;
use crate::models::{Filter, NewTodo, SortBy, Theme, Todo, TodoId, TodoPatch, ViewState};
use crate::storage::SnapshotStorage;

/// Fixed storage key of the snapshot
pub const STORAGE_KEY: &str = "todo-storage";

/// Storage key of the view state when the server owns the collection
pub const VIEW_STORAGE_KEY: &str = "todo-view";

const SNAPSHOT_VERSION: u32 = 0;

/// Everything the store persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(flatten)]
    pub view: ViewState,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

/// Read the view state saved under [`VIEW_STORAGE_KEY`], defaulting when absent
pub(crate) fn load_view_state<S: SnapshotStorage>(storage: &S) -> TodoResult<ViewState> {
    match storage.load(VIEW_STORAGE_KEY)? {
        Some(raw) => {
            let envelope: Envelope<ViewState> = serde_json::from_str(&raw)?;
            debug!(version = envelope.version, "Restored view state");
            Ok(envelope.state)
        }
        None => Ok(ViewState::default()),
    }
}

pub(crate) fn save_view_state<S: SnapshotStorage>(
    storage: &S,
    view: &ViewState,
) -> TodoResult<()> {
    let raw = serde_json::to_string(&Envelope {
        state: view,
        version: SNAPSHOT_VERSION,
    })?;
    storage.save(VIEW_STORAGE_KEY, &raw)
}

pub struct TodoStore<S: SnapshotStorage> {
    storage: S,
    clock: Arc<dyn Clock>,
    state: StoreState,
}

impl<S: SnapshotStorage> TodoStore<S> {
    /// Open the store, restoring the last snapshot if one exists
    pub fn open(storage: S) -> TodoResult<Self> {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: S, clock: Arc<dyn Clock>) -> TodoResult<Self> {
        let state = match storage.load(STORAGE_KEY)? {
            Some(raw) => {
                let envelope: Envelope<StoreState> = serde_json::from_str(&raw)?;
                debug!(
                    todos = envelope.state.todos.len(),
                    version = envelope.version,
                    "Restored todo snapshot"
                );
                envelope.state
            }
            None => StoreState::default(),
        };

        Ok(Self {
            storage,
            clock,
            state,
        })
    }

    pub fn todos(&self) -> &[Todo] {
        &self.state.todos
    }

    pub fn view_state(&self) -> &ViewState {
        &self.state.view
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.state.todos.iter().find(|t| &t.id == id)
    }

    /// Append a new todo with a fresh id and both timestamps set to now.
    ///
    /// Input is not validated here; callers reject blank titles first.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub fn add_todo(&mut self, input: NewTodo) -> TodoResult<Todo> {
        let mut id = TodoId::generate();
        while self.get(&id).is_some() {
            id = TodoId::generate();
        }

        let todo = Todo::from_new(id, input, self.clock.now());
        self.state.todos.push(todo.clone());
        self.persist()?;

        debug!(todo_id = %todo.id, "Added todo");
        Ok(todo)
    }

    /// Flip completion. `Ok(None)` if no todo has this id.
    #[instrument(skip(self), fields(todo_id = %id))]
    pub fn toggle_todo(&mut self, id: &TodoId) -> TodoResult<Option<Todo>> {
        let now = self.clock.now();
        let Some(todo) = self.state.todos.iter_mut().find(|t| &t.id == id) else {
            debug!("Toggle ignored, unknown id");
            return Ok(None);
        };

        todo.toggle(now);
        let updated = todo.clone();
        self.persist()?;
        Ok(Some(updated))
    }

    /// Merge `patch` into the matching todo. `Ok(None)` if no todo has this id.
    #[instrument(skip(self, patch), fields(todo_id = %id))]
    pub fn update_todo(&mut self, id: &TodoId, patch: TodoPatch) -> TodoResult<Option<Todo>> {
        let now = self.clock.now();
        let Some(todo) = self.state.todos.iter_mut().find(|t| &t.id == id) else {
            debug!("Update ignored, unknown id");
            return Ok(None);
        };

        todo.apply_patch(patch, now);
        let updated = todo.clone();
        self.persist()?;
        Ok(Some(updated))
    }

    /// Remove the matching todo. Returns whether anything was removed.
    #[instrument(skip(self), fields(todo_id = %id))]
    pub fn delete_todo(&mut self, id: &TodoId) -> TodoResult<bool> {
        let before = self.state.todos.len();
        self.state.todos.retain(|t| &t.id != id);

        if self.state.todos.len() == before {
            debug!("Delete ignored, unknown id");
            return Ok(false);
        }

        self.persist()?;
        Ok(true)
    }

    pub fn set_filter(&mut self, filter: Filter) -> TodoResult<()> {
        self.state.view.filter = filter;
        self.persist()
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) -> TodoResult<()> {
        self.state.view.sort_by = sort_by;
        self.persist()
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) -> TodoResult<()> {
        self.state.view.search_query = query.into();
        self.persist()
    }

    pub fn set_theme(&mut self, theme: Theme) -> TodoResult<()> {
        self.state.view.theme = theme;
        self.persist()
    }

    /// Switch between light and dark, returning the new theme
    pub fn toggle_theme(&mut self) -> TodoResult<Theme> {
        let theme = self.state.view.theme.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    pub fn set_view_state(&mut self, view: ViewState) -> TodoResult<()> {
        self.state.view = view;
        self.persist()
    }

    fn persist(&self) -> TodoResult<()> {
        let envelope = Envelope {
            state: &self.state,
            version: SNAPSHOT_VERSION,
        };
        let raw = serde_json::to_string(&envelope)?;
        self.storage.save(STORAGE_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::TodoError;
    use crate::models::Priority;
    use crate::storage::MemoryStorage;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashSet;

    fn store_with_clock() -> (TodoStore<MemoryStorage>, Arc<ManualClock>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap(),
        ));
        let store = TodoStore::with_clock(storage.clone(), clock.clone()).unwrap();
        (store, clock, storage)
    }

    #[test]
    fn test_open_empty_uses_defaults() {
        let (store, _, _) = store_with_clock();
        assert!(store.todos().is_empty());
        assert_eq!(store.view_state(), &ViewState::default());
    }

    #[test]
    fn test_add_assigns_unique_ids_in_insertion_order() {
        let (mut store, _, _) = store_with_clock();

        for i in 0..50 {
            store.add_todo(NewTodo::new(format!("task {}", i))).unwrap();
        }

        let ids: HashSet<_> = store.todos().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids.len(), 50);
        assert_eq!(store.todos()[0].title, "task 0");
        assert_eq!(store.todos()[49].title, "task 49");
    }

    #[test]
    fn test_add_sets_timestamps_and_dedupes_tags() {
        let (mut store, clock, _) = store_with_clock();
        let todo = store
            .add_todo(NewTodo {
                title: "Groceries".into(),
                tags: vec!["shop".into(), "shop".into(), " home ".into()],
                ..Default::default()
            })
            .unwrap();

        assert_eq!(todo.created_at, clock.now());
        assert_eq!(todo.updated_at, todo.created_at);
        assert_eq!(todo.tags, vec!["shop", "home"]);
        assert!(!todo.completed);
        assert_eq!(todo.priority, Priority::Medium);
    }

    #[test]
    fn test_toggle_twice_restores_and_advances_updated_at() {
        let (mut store, clock, _) = store_with_clock();
        let todo = store.add_todo(NewTodo::new("Walk dog")).unwrap();

        clock.advance(Duration::seconds(1));
        let first = store.toggle_todo(&todo.id).unwrap().unwrap();
        assert!(first.completed);
        assert!(first.updated_at > todo.updated_at);

        clock.advance(Duration::seconds(1));
        let second = store.toggle_todo(&todo.id).unwrap().unwrap();
        assert!(!second.completed);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.created_at, todo.created_at);
    }

    #[test]
    fn test_unknown_id_mutations_are_noops() {
        let (mut store, _, _) = store_with_clock();
        store.add_todo(NewTodo::new("keep me")).unwrap();
        let before = store.todos().to_vec();
        let missing = TodoId::new("missing");

        assert_eq!(store.toggle_todo(&missing).unwrap(), None);
        assert_eq!(
            store
                .update_todo(
                    &missing,
                    TodoPatch {
                        title: Some("x".into()),
                        ..Default::default()
                    }
                )
                .unwrap(),
            None
        );
        assert!(!store.delete_todo(&missing).unwrap());
        assert_eq!(store.todos(), before.as_slice());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (mut store, _, _) = store_with_clock();
        let a = store.add_todo(NewTodo::new("a")).unwrap();
        store.add_todo(NewTodo::new("b")).unwrap();

        assert!(store.delete_todo(&a.id).unwrap());
        let after_first = store.todos().to_vec();
        assert!(!store.delete_todo(&a.id).unwrap());
        assert_eq!(store.todos(), after_first.as_slice());
        assert_eq!(store.todos().len(), 1);
    }

    #[test]
    fn test_update_merges_fields() {
        let (mut store, clock, _) = store_with_clock();
        let todo = store.add_todo(NewTodo::new("Draft")).unwrap();

        clock.advance(Duration::minutes(5));
        let updated = store
            .update_todo(
                &todo.id,
                TodoPatch {
                    title: Some("Final".into()),
                    priority: Some(Priority::Low),
                    reminder: Some(true),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.priority, Priority::Low);
        assert!(updated.reminder);
        assert_eq!(updated.updated_at, clock.now());
        assert_eq!(store.get(&todo.id), Some(&updated));
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let (mut store, clock, storage) = store_with_clock();
        let todo = store.add_todo(NewTodo::new("Persist me")).unwrap();
        store.toggle_todo(&todo.id).unwrap();
        store.set_filter(Filter::Completed).unwrap();
        store.set_sort_by(SortBy::Alphabetical).unwrap();
        store.set_search_query("pers").unwrap();
        assert_eq!(store.toggle_theme().unwrap(), Theme::Dark);

        let reopened = TodoStore::with_clock(storage, clock).unwrap();
        assert_eq!(reopened.state(), store.state());
        assert_eq!(reopened.view_state().filter, Filter::Completed);
        assert_eq!(reopened.view_state().theme, Theme::Dark);
    }

    #[test]
    fn test_snapshot_envelope_shape() {
        let (mut store, _, storage) = store_with_clock();
        store
            .add_todo(NewTodo {
                title: "Shape".into(),
                priority: Priority::High,
                ..Default::default()
            })
            .unwrap();

        let raw = storage.load(STORAGE_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["version"], 0);
        assert_eq!(json["state"]["filter"], "all");
        assert_eq!(json["state"]["sortBy"], "date");
        assert_eq!(json["state"]["searchQuery"], "");
        assert_eq!(json["state"]["todos"][0]["priority"], "high");
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let storage = MemoryStorage::new();
        storage.save(STORAGE_KEY, "{not json").unwrap();

        let result = TodoStore::open(storage);
        assert!(matches!(result, Err(TodoError::Serialization(_))));
    }

    #[test]
    fn test_view_state_round_trips_under_its_own_key() {
        let storage = MemoryStorage::new();
        assert_eq!(load_view_state(&storage).unwrap(), ViewState::default());

        let view = ViewState {
            filter: Filter::Active,
            theme: Theme::Dark,
            ..Default::default()
        };
        save_view_state(&storage, &view).unwrap();

        assert_eq!(load_view_state(&storage).unwrap(), view);
        assert!(storage.load(STORAGE_KEY).unwrap().is_none());
        let raw = storage.load(VIEW_STORAGE_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["state"]["theme"], "dark");
    }

    struct ReadOnlyStorage;

    impl SnapshotStorage for ReadOnlyStorage {
        fn load(&self, _key: &str) -> TodoResult<Option<String>> {
            Ok(None)
        }

        fn save(&self, _key: &str, _contents: &str) -> TodoResult<()> {
            Err(TodoError::Storage("read-only".to_string()))
        }
    }

    #[test]
    fn test_persistence_failure_surfaces_to_caller() {
        let mut store = TodoStore::open(ReadOnlyStorage).unwrap();
        let result = store.add_todo(NewTodo::new("cannot persist"));
        assert!(matches!(result, Err(TodoError::Storage(_))));
    }
}
