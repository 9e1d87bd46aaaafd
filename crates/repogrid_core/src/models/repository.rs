//! Repository records and the cursor-connection wire format.

use super::{Cursor, FieldError, Page, Row};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row field holding the repository name (the only editable field).
pub const FIELD_NAME: &str = "name";
/// Row field holding the stargazer count.
pub const FIELD_STARGAZERS: &str = "stargazer_count";
/// Row field holding the creation timestamp.
pub const FIELD_CREATED_AT: &str = "created_at";
/// Row field holding the last-update timestamp.
pub const FIELD_UPDATED_AT: &str = "updated_at";
/// Row field flagging forks.
pub const FIELD_IS_FORK: &str = "is_fork";

/// A repository owned by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub stargazer_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_fork: bool,
}

impl Repository {
    /// Create a repository with a fresh id and `updated_at == created_at`.
    pub fn new(
        name: impl Into<String>,
        stargazer_count: u64,
        created_at: DateTime<Utc>,
        is_fork: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            stargazer_count,
            created_at,
            updated_at: created_at,
            is_fork,
        }
    }

    /// Project this record into a grid row under `cursor`.
    pub fn to_row(&self, cursor: Cursor) -> Row {
        let stars = i64::try_from(self.stargazer_count).unwrap_or(i64::MAX);
        Row::new(cursor, self.id.clone())
            .with_field(FIELD_NAME, self.name.as_str())
            .with_field(FIELD_STARGAZERS, stars)
            .with_field(FIELD_CREATED_AT, self.created_at)
            .with_field(FIELD_UPDATED_AT, self.updated_at)
            .with_field(FIELD_IS_FORK, self.is_fork)
    }
}

/// A repository plus the cursor it was issued under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub cursor: Cursor,
    pub node: Repository,
}

/// One page of the repository connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub edges: Vec<Edge>,
    pub total_count: u64,
    pub has_next_page: bool,
}

impl Connection {
    /// Convert the wire connection into grid rows.
    pub fn into_page(self) -> Page {
        let rows = self
            .edges
            .into_iter()
            .map(|edge| edge.node.to_row(edge.cursor))
            .collect();
        Page {
            rows,
            total_count: Some(self.total_count),
            has_next_page: self.has_next_page,
        }
    }
}

/// Request payload for renaming a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// Response payload for a rename; `repository` is absent when rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameResponse {
    pub repository: Option<Repository>,
    #[serde(default)]
    pub field_errors: Vec<FieldError>,
}
