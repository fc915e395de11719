//! Todo Entity
//!
//! One row of the remote `todos` table.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Row id assigned by the remote store
pub type TodoId = i64;

/// Opaque user identifier issued by the identity service
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A task as stored remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// Free-text description
    pub task: String,
    /// Completion flag (remote default: false)
    pub is_complete: bool,
    /// Owning user
    pub user_id: UserId,
    /// Insertion time, used for ordering
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload; id, completion flag and timestamp are filled in remotely
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTodo {
    pub task: String,
    pub user_id: UserId,
}

impl NewTodo {
    pub fn new(task: impl Into<String>, user_id: UserId) -> Self {
        Self {
            task: task.into(),
            user_id,
        }
    }
}

/// Completion-flag patch sent with an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TodoUpdate {
    pub is_complete: bool,
}

impl TodoUpdate {
    pub fn completion(is_complete: bool) -> Self {
        Self { is_complete }
    }
}

/// Accepts both `timestamptz` (RFC 3339) and plain `timestamp` columns.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}
