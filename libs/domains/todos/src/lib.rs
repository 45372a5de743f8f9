//! Todos Domain
//!
//! Task management over two interchangeable backends: a persisted local store
//! and the remote `/api/todos` HTTP API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Validation, view state, dashboard
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Trait + local / remote adapters
//! └──┬───────┬──┘
//!    │       │
//! ┌──▼───┐ ┌─▼──────┐
//! │Store │ │ Client │  ← Snapshot persistence / HTTP + wire conversions
//! └──────┘ └────────┘
//! ```
//!
//! View derivation (`view`) is pure and works on any slice of todos.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_todos::{FileStorage, LocalTodoRepository, NewTodo, TodoService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = LocalTodoRepository::open(FileStorage::new(".todo"))?;
//! let service = TodoService::new(repository);
//!
//! service.create_todo(NewTodo::new("Pay rent")).await?;
//! let visible = service.visible_todos().await?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod client;
pub mod clock;
pub mod conversions;
pub mod error;
pub mod local;
pub mod models;
pub mod remote;
pub mod repository;
pub mod service;
pub mod storage;
pub mod store;
pub mod view;

// Re-export commonly used types
pub use cancel::{cancellable, CancelToken};
pub use client::TodoApiClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{TodoError, TodoResult};
pub use local::LocalTodoRepository;
pub use models::{
    parse_tags, Filter, NewTodo, Priority, SortBy, Theme, Todo, TodoId, TodoPatch, ViewState,
};
pub use remote::RemoteTodoRepository;
pub use repository::TodoRepository;
pub use service::{Dashboard, TodoService};
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};
pub use store::{StoreState, TodoStore, STORAGE_KEY, VIEW_STORAGE_KEY};
pub use view::{derive_view, DashboardStats, PriorityBreakdown};
