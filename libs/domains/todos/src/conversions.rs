//! Domain ↔ wire conversions for the remote todo API
//!
//! The API speaks its own dialect of the entity:
//! - priority as `LOW` / `MEDIUM` / `HIGH`
//! - timestamps as ISO-8601 local date-times without an offset (read as UTC)
//! - `id` absent on create, nullable collections and strings
//!
//! Everything crossing the HTTP boundary goes through [`TodoDocument`]; the
//! rest of the crate only sees [`Todo`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TodoError, TodoResult};
use crate::models::{normalize_tags, NewTodo, Priority, Todo, TodoId};

// ============================================================================
// Priority Conversions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WirePriority {
    Low,
    Medium,
    High,
}

impl WirePriority {
    /// Literal used in `/priority/{priority}` paths
    pub fn as_str(self) -> &'static str {
        match self {
            WirePriority::Low => "LOW",
            WirePriority::Medium => "MEDIUM",
            WirePriority::High => "HIGH",
        }
    }
}

impl From<Priority> for WirePriority {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => WirePriority::Low,
            Priority::Medium => WirePriority::Medium,
            Priority::High => WirePriority::High,
        }
    }
}

impl From<WirePriority> for Priority {
    fn from(priority: WirePriority) -> Self {
        match priority {
            WirePriority::Low => Priority::Low,
            WirePriority::Medium => Priority::Medium,
            WirePriority::High => Priority::High,
        }
    }
}

// ============================================================================
// Timestamp format
// ============================================================================

/// Serde adapter for optional wire timestamps.
///
/// Writes `2026-03-01T09:30:00.000` (UTC, no offset). Reads that form, the
/// same without fraction or seconds, and RFC 3339 with an explicit offset.
pub mod wire_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

    const ACCEPTED_NAIVE: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn format(value: &DateTime<Utc>) -> String {
        value.naive_utc().format(FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ACCEPTED_NAIVE
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s))),
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// Todo as transmitted to and from the remote API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        with = "wire_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "wire_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "wire_datetime")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<WirePriority>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub reminder: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// Struct Conversions: Domain → Wire
// ============================================================================

impl From<&NewTodo> for TodoDocument {
    fn from(input: &NewTodo) -> Self {
        TodoDocument {
            id: None,
            title: input.title.clone(),
            description: Some(input.description.clone()),
            completed: input.completed,
            created_at: None,
            updated_at: None,
            due_date: input.due_date,
            priority: Some(input.priority.into()),
            tags: Some(input.tags.clone()),
            category: input.category.clone(),
            reminder: input.reminder,
            notes: input.notes.clone(),
        }
    }
}

impl From<&Todo> for TodoDocument {
    fn from(todo: &Todo) -> Self {
        TodoDocument {
            id: Some(todo.id.to_string()),
            title: todo.title.clone(),
            description: Some(todo.description.clone()),
            completed: todo.completed,
            created_at: Some(todo.created_at),
            updated_at: Some(todo.updated_at),
            due_date: todo.due_date,
            priority: Some(todo.priority.into()),
            tags: Some(todo.tags.clone()),
            category: todo.category.clone(),
            reminder: todo.reminder,
            notes: todo.notes.clone(),
        }
    }
}

// ============================================================================
// Struct Conversions: Wire → Domain
// ============================================================================

impl TryFrom<TodoDocument> for Todo {
    type Error = TodoError;

    fn try_from(doc: TodoDocument) -> Result<Self, Self::Error> {
        let id = doc
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TodoError::Serialization("todo from server has no id".to_string()))?;

        let title = doc.title.trim();
        if title.is_empty() {
            return Err(TodoError::Serialization(format!(
                "todo {} from server has a blank title",
                id
            )));
        }
        let title = title.to_string();

        let (created_at, updated_at) = match (doc.created_at, doc.updated_at) {
            (Some(created), Some(updated)) => (created, updated.max(created)),
            (Some(one), None) | (None, Some(one)) => (one, one),
            (None, None) => {
                return Err(TodoError::Serialization(format!(
                    "todo {} from server has no timestamps",
                    id
                )));
            }
        };

        Ok(Todo {
            id: TodoId::new(id),
            title,
            description: doc.description.unwrap_or_default(),
            completed: doc.completed,
            due_date: doc.due_date,
            priority: doc.priority.map(Priority::from).unwrap_or_default(),
            tags: normalize_tags(doc.tags.unwrap_or_default()),
            category: doc.category,
            reminder: doc.reminder,
            notes: doc.notes,
            created_at,
            updated_at,
        })
    }
}

/// Decode a list response, failing on the first malformed entry
pub fn decode_todos(docs: Vec<TodoDocument>) -> TodoResult<Vec<Todo>> {
    docs.into_iter().map(Todo::try_from).collect()
}
