//! HTTP client for the remote todo API (`/api/todos`)

use chrono::{DateTime, Utc};
use core_config::ApiConfig;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::conversions::{decode_todos, wire_datetime, TodoDocument, WirePriority};
use crate::error::{TodoError, TodoResult};
use crate::models::{NewTodo, Priority, Todo, TodoId};

/// Thin client over the todo REST resource.
///
/// Every call is independent: no retries, no caching. Non-2xx responses come
/// back as [`TodoError::RemoteStatus`], except 404 on id-addressed calls.
#[derive(Clone, Debug)]
pub struct TodoApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl TodoApiClient {
    pub fn new(config: &ApiConfig) -> TodoResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TodoError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn item_url(&self, id: &TodoId) -> String {
        self.url(&format!("/{}", urlencoding::encode(id.as_str())))
    }

    /// GET / — full collection
    #[instrument(skip(self))]
    pub async fn get_all_todos(&self) -> TodoResult<Vec<Todo>> {
        self.get_list(&self.base_url).await
    }

    /// GET /{id} — `None` when the server answers 404
    #[instrument(skip(self), fields(todo_id = %id))]
    pub async fn get_todo(&self, id: &TodoId) -> TodoResult<Option<Todo>> {
        let response = self.client.get(self.item_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc: TodoDocument = decode_body(ensure_success(response).await?).await?;
        Ok(Some(Todo::try_from(doc)?))
    }

    /// POST / — returns the record with server-assigned id and timestamps
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_todo(&self, input: &NewTodo) -> TodoResult<Todo> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&TodoDocument::from(input))
            .send()
            .await?;

        let doc: TodoDocument = decode_body(ensure_success(response).await?).await?;
        let todo = Todo::try_from(doc)?;
        debug!(todo_id = %todo.id, "Created remote todo");
        Ok(todo)
    }

    /// PUT /{id} — replaces every mutable field, returns the stored record
    #[instrument(skip(self, todo), fields(todo_id = %id))]
    pub async fn update_todo(&self, id: &TodoId, todo: &Todo) -> TodoResult<Todo> {
        let response = self
            .client
            .put(self.item_url(id))
            .json(&TodoDocument::from(todo))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TodoError::NotFound(id.clone()));
        }

        let doc: TodoDocument = decode_body(ensure_success(response).await?).await?;
        Todo::try_from(doc)
    }

    /// DELETE /{id}
    #[instrument(skip(self), fields(todo_id = %id))]
    pub async fn delete_todo(&self, id: &TodoId) -> TodoResult<()> {
        let response = self.client.delete(self.item_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TodoError::NotFound(id.clone()));
        }

        ensure_success(response).await?;
        Ok(())
    }

    /// GET /category/{category} — filtering is done by the server
    #[instrument(skip(self))]
    pub async fn get_by_category(&self, category: &str) -> TodoResult<Vec<Todo>> {
        let url = self.url(&format!("/category/{}", urlencoding::encode(category)));
        self.get_list(&url).await
    }

    /// GET /priority/{PRIORITY}
    #[instrument(skip(self))]
    pub async fn get_by_priority(&self, priority: Priority) -> TodoResult<Vec<Todo>> {
        let url = self.url(&format!("/priority/{}", WirePriority::from(priority).as_str()));
        self.get_list(&url).await
    }

    /// GET /due-before?date=
    #[instrument(skip(self))]
    pub async fn get_due_before(&self, before: DateTime<Utc>) -> TodoResult<Vec<Todo>> {
        let response = self
            .client
            .get(self.url("/due-before"))
            .query(&[("date", wire_datetime::format(&before))])
            .send()
            .await?;

        let docs: Vec<TodoDocument> = decode_body(ensure_success(response).await?).await?;
        decode_todos(docs)
    }

    /// GET /health — the server's own status line
    #[instrument(skip(self))]
    pub async fn health(&self) -> TodoResult<String> {
        let response = self.client.get(self.url("/health")).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.text().await?)
    }

    async fn get_list(&self, url: &str) -> TodoResult<Vec<Todo>> {
        let response = self.client.get(url).send().await?;
        let docs: Vec<TodoDocument> = decode_body(ensure_success(response).await?).await?;
        let todos = decode_todos(docs)?;
        debug!(count = todos.len(), "Fetched remote todos");
        Ok(todos)
    }
}

async fn ensure_success(response: Response) -> TodoResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "Todo API request failed");
    Err(TodoError::RemoteStatus {
        status: status.as_u16(),
        body,
    })
}

async fn decode_body<T: DeserializeOwned>(response: Response) -> TodoResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
