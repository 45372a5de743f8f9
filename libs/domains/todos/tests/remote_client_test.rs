//! Integration tests for the remote todo API client
//!
//! These tests run against the in-process fake API from test-utils to check:
//! - Wire dialect (uppercase priority, offset-less timestamps, no id on create)
//! - 404 handling on id-addressed calls
//! - Error statuses surfacing unchanged

use chrono::{TimeZone, Utc};
use core_config::ApiConfig;
use domain_todos::*;
use serde_json::json;
use std::time::Duration;
use test_utils::{assertions::*, TestDataBuilder, TestTodoApi};

fn client_for(api: &TestTodoApi) -> TodoApiClient {
    TodoApiClient::new(&ApiConfig::new(api.base_url(), Duration::from_secs(5))).unwrap()
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
async fn test_create_uses_server_id_and_uppercase_priority() {
    let api = TestTodoApi::new().await;
    let client = client_for(&api);
    let builder = TestDataBuilder::from_test_name("create_remote");

    let created = client
        .create_todo(&NewTodo {
            title: builder.title("rent"),
            priority: Priority::High,
            tags: vec!["bills".into()],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(created.title, builder.title("rent"));
    assert_eq!(created.priority, Priority::High);
    assert_eq!(created.id.as_str().len(), 24);
    assert_eq!(created.tags, vec!["bills"]);

    let docs = api.documents();
    assert_eq!(docs.len(), 1);
    assert_json_field(&docs[0], "priority", &json!("HIGH"));
    assert_json_field(&docs[0], "completed", &json!(false));
}

#[tokio::test]
async fn test_list_and_get() {
    let api = TestTodoApi::new().await;
    let client = client_for(&api);
    let id = api.seed(json!({
        "title": "Seeded",
        "priority": "LOW",
        "completed": true,
        "tags": null
    }));

    let all = client.get_all_todos().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].priority, Priority::Low);
    assert!(all[0].tags.is_empty());

    let fetched = client.get_todo(&TodoId::new(id.clone())).await.unwrap();
    let fetched = assert_some(fetched, "seeded todo should exist");
    assert_eq!(fetched.id.as_str(), id);
    assert!(fetched.completed);
}

#[tokio::test]
async fn test_update_replaces_fields_and_keeps_created_at() {
    let api = TestTodoApi::new().await;
    let client = client_for(&api);
    let created = client.create_todo(&NewTodo::new("Draft")).await.unwrap();

    let mut edited = created.clone();
    edited.title = "Final".into();
    edited.completed = true;
    edited.category = Some("work".into());

    let stored = client.update_todo(&created.id, &edited).await.unwrap();
    assert_eq!(stored.title, "Final");
    assert!(stored.completed);
    assert_eq!(stored.category.as_deref(), Some("work"));
    assert_eq!(stored.created_at, created.created_at);
    assert!(stored.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_delete_removes_document() {
    let api = TestTodoApi::new().await;
    let client = client_for(&api);
    let created = client.create_todo(&NewTodo::new("Temp")).await.unwrap();

    client.delete_todo(&created.id).await.unwrap();
    assert!(api.documents().is_empty());
}

// ============================================================================
// Not found / failures
// ============================================================================

#[tokio::test]
async fn test_unknown_id_mapping() {
    let api = TestTodoApi::new().await;
    let client = client_for(&api);
    let missing = TodoId::new("does-not-exist");

    assert!(client.get_todo(&missing).await.unwrap().is_none());

    let placeholder = Todo::from_new(missing.clone(), NewTodo::new("x"), Utc::now());
    assert!(matches!(
        client.update_todo(&missing, &placeholder).await,
        Err(TodoError::NotFound(_))
    ));
    assert!(matches!(
        client.delete_todo(&missing).await,
        Err(TodoError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_error_status_is_surfaced_once() {
    let api = TestTodoApi::new().await;
    let client = client_for(&api);
    api.fail_next(500, "database unavailable");

    let result = client.get_all_todos().await;
    match result {
        Err(TodoError::RemoteStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "database unavailable");
        }
        other => panic!("expected RemoteStatus, got {:?}", other),
    }

    // No retry happened; the next call succeeds normally
    assert_eq!(api.request_count("GET", "/api/todos"), 1);
    assert!(client.get_all_todos().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_remote_error() {
    let api = TestTodoApi::new().await;
    let base_url = api.base_url();
    drop(api);
    tokio::task::yield_now().await;

    let client =
        TodoApiClient::new(&ApiConfig::new(base_url, Duration::from_secs(2))).unwrap();
    let result = client.get_all_todos().await;
    assert!(matches!(
        result,
        Err(TodoError::Remote(_)) | Err(TodoError::Timeout(_))
    ));
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_by_priority_and_category() {
    let api = TestTodoApi::new().await;
    let client = client_for(&api);
    api.seed(json!({ "title": "a", "priority": "HIGH", "category": "home office" }));
    api.seed(json!({ "title": "b", "priority": "LOW", "category": "errands" }));
    api.seed(json!({ "title": "c", "priority": "HIGH", "category": "errands" }));

    let high = client.get_by_priority(Priority::High).await.unwrap();
    assert_order(&high, |t| t.title.clone(), &["a".to_string(), "c".to_string()]);
    assert_eq!(api.request_count("GET", "/api/todos/priority/HIGH"), 1);

    let office = client.get_by_category("home office").await.unwrap();
    assert_eq!(office.len(), 1);
    assert_eq!(office[0].title, "a");
}

#[tokio::test]
async fn test_due_before() {
    let api = TestTodoApi::new().await;
    let client = client_for(&api);
    api.seed(json!({ "title": "march", "dueDate": "2026-03-01T09:00:00" }));
    api.seed(json!({ "title": "april", "dueDate": "2026-04-01T09:00:00" }));
    api.seed(json!({ "title": "undated", "dueDate": null }));

    let cutoff = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
    let due = client.get_due_before(cutoff).await.unwrap();

    assert_eq!(due.len(), 1);
    assert_eq!(due[0].title, "march");
    assert_eq!(
        due[0].due_date,
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn test_health() {
    let api = TestTodoApi::new().await;
    let client = client_for(&api);

    assert_eq!(client.health().await.unwrap(), "Connection successful");
}
