//! In-process fake of the remote todo API
//!
//! Serves the `/api/todos` resource from memory on an ephemeral port, with the
//! same dialect as the real backend: uppercase priorities, offset-less
//! timestamps, server-assigned opaque ids, empty 200 on delete and 404 for
//! unknown ids. Every request is recorded so tests can assert on traffic.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, Request, State},
    http::{Response, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
};
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const BASE_PATH: &str = "/api/todos";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const PRIORITIES: [&str; 3] = ["LOW", "MEDIUM", "HIGH"];

/// A request the fake server has seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
}

#[derive(Default)]
struct Inner {
    todos: Vec<Map<String, Value>>,
    next_id: u64,
    requests: Vec<RecordedRequest>,
    fail_next: Option<(StatusCode, String)>,
}

#[derive(Clone, Default)]
struct FakeState {
    inner: Arc<Mutex<Inner>>,
}

impl FakeState {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Running fake API; the server task stops when this is dropped
///
/// # Example
///
/// ```no_run
/// use test_utils::TestTodoApi;
///
/// # async fn example() {
/// let api = TestTodoApi::new().await;
/// let base_url = api.base_url(); // http://127.0.0.1:<port>/api/todos
/// # }
/// ```
pub struct TestTodoApi {
    addr: SocketAddr,
    state: FakeState,
    handle: JoinHandle<()>,
}

impl TestTodoApi {
    pub async fn new() -> Self {
        let state = FakeState::default();
        let app = router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake todo API");
        let addr = listener
            .local_addr()
            .expect("Failed to read fake todo API address");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake todo API stopped");
            }
        });

        tracing::info!(%addr, "Fake todo API ready");

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL of the todo resource, without trailing slash
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, BASE_PATH)
    }

    /// Store a document as if it had been created earlier, returning its id.
    ///
    /// Missing `id`, `createdAt` and `updatedAt` are filled in.
    pub fn seed(&self, document: Value) -> String {
        let mut doc = match document {
            Value::Object(map) => map,
            other => panic!("seed expects a JSON object, got {}", other),
        };

        let mut inner = self.state.lock();
        let id = match doc.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => next_id(&mut inner),
        };
        doc.insert("id".into(), Value::String(id.clone()));
        let now = timestamp();
        doc.entry("createdAt").or_insert_with(|| now.clone().into());
        doc.entry("updatedAt").or_insert_with(|| now.into());
        inner.todos.push(doc);
        id
    }

    /// Current server-side documents, in insertion order
    pub fn documents(&self) -> Vec<Value> {
        self.state
            .lock()
            .todos
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }

    /// Answer the next request with `status` and `body` instead of handling it
    pub fn fail_next(&self, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).expect("Invalid status code");
        self.state.lock().fail_next = Some((status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Number of recorded requests with this method and exact path
    pub fn request_count(&self, method: &str, path: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

impl Drop for TestTodoApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: FakeState) -> Router {
    Router::new()
        .route(BASE_PATH, get(list_todos).post(create_todo))
        .route(&format!("{BASE_PATH}/health"), get(health))
        .route(&format!("{BASE_PATH}/due-before"), get(due_before))
        .route(
            &format!("{BASE_PATH}/category/{{category}}"),
            get(by_category),
        )
        .route(
            &format!("{BASE_PATH}/priority/{{priority}}"),
            get(by_priority),
        )
        .route(
            &format!("{BASE_PATH}/{{id}}"),
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

async fn record_request(
    State(state): State<FakeState>,
    request: Request,
    next: Next,
) -> Response<Body> {
    let failure = {
        let mut inner = state.lock();
        inner.requests.push(RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
        });
        inner.fail_next.take()
    };

    match failure {
        Some((status, body)) => (status, body).into_response(),
        None => next.run(request).await,
    }
}

async fn list_todos(State(state): State<FakeState>) -> Json<Vec<Value>> {
    let inner = state.lock();
    Json(inner.todos.iter().cloned().map(Value::Object).collect())
}

async fn create_todo(State(state): State<FakeState>, Json(body): Json<Value>) -> Response<Body> {
    let Value::Object(mut doc) = body else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if !priority_is_valid(&doc) {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let mut inner = state.lock();
    let id = next_id(&mut inner);
    let now = timestamp();
    doc.insert("id".into(), Value::String(id));
    doc.insert("createdAt".into(), Value::String(now.clone()));
    doc.insert("updatedAt".into(), Value::String(now));
    inner.todos.push(doc.clone());

    Json(Value::Object(doc)).into_response()
}

async fn get_todo(State(state): State<FakeState>, Path(id): Path<String>) -> Response<Body> {
    let inner = state.lock();
    match inner.todos.iter().find(|doc| doc_id(doc) == Some(&id)) {
        Some(doc) => Json(Value::Object(doc.clone())).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Replaces every mutable field; id and createdAt stay server-owned
async fn update_todo(
    State(state): State<FakeState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response<Body> {
    let Value::Object(details) = body else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if !priority_is_valid(&details) {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let mut inner = state.lock();
    let Some(doc) = inner.todos.iter_mut().find(|doc| doc_id(doc) == Some(&id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    for field in [
        "title",
        "description",
        "completed",
        "dueDate",
        "priority",
        "tags",
        "category",
        "reminder",
        "notes",
    ] {
        doc.insert(
            field.into(),
            details.get(field).cloned().unwrap_or(Value::Null),
        );
    }
    doc.insert("updatedAt".into(), Value::String(timestamp()));

    Json(Value::Object(doc.clone())).into_response()
}

async fn delete_todo(State(state): State<FakeState>, Path(id): Path<String>) -> StatusCode {
    let mut inner = state.lock();
    let before = inner.todos.len();
    inner.todos.retain(|doc| doc_id(doc) != Some(&id));

    if inner.todos.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    }
}

async fn by_category(
    State(state): State<FakeState>,
    Path(category): Path<String>,
) -> Json<Vec<Value>> {
    filtered(&state, |doc| {
        doc.get("category").and_then(Value::as_str) == Some(category.as_str())
    })
}

async fn by_priority(
    State(state): State<FakeState>,
    Path(priority): Path<String>,
) -> Response<Body> {
    if !PRIORITIES.contains(&priority.as_str()) {
        return StatusCode::BAD_REQUEST.into_response();
    }

    filtered(&state, |doc| {
        doc.get("priority").and_then(Value::as_str) == Some(priority.as_str())
    })
    .into_response()
}

#[derive(Deserialize)]
struct DueBeforeQuery {
    date: String,
}

async fn due_before(
    State(state): State<FakeState>,
    Query(query): Query<DueBeforeQuery>,
) -> Response<Body> {
    let Some(limit) = parse_timestamp(&query.date) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    filtered(&state, |doc| {
        doc.get("dueDate")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .is_some_and(|due| due < limit)
    })
    .into_response()
}

async fn health() -> &'static str {
    "Connection successful"
}

fn filtered(state: &FakeState, keep: impl Fn(&Map<String, Value>) -> bool) -> Json<Vec<Value>> {
    let inner = state.lock();
    Json(
        inner
            .todos
            .iter()
            .filter(|doc| keep(doc))
            .cloned()
            .map(Value::Object)
            .collect(),
    )
}

fn doc_id(doc: &Map<String, Value>) -> Option<&String> {
    match doc.get("id") {
        Some(Value::String(id)) => Some(id),
        _ => None,
    }
}

fn priority_is_valid(doc: &Map<String, Value>) -> bool {
    match doc.get("priority") {
        None | Some(Value::Null) => true,
        Some(Value::String(p)) => PRIORITIES.contains(&p.as_str()),
        Some(_) => false,
    }
}

// Opaque 24-hex-digit ids, like a document store would hand out
fn next_id(inner: &mut Inner) -> String {
    inner.next_id += 1;
    format!("{:024x}", 0x65f0_0000_u64 + inner.next_id)
}

fn timestamp() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}
