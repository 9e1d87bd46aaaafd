//! Request/response shapes for the remote collaborators.

use super::{Cursor, FieldValue, Row, SortOrder};
use serde::{Deserialize, Serialize};

/// A forward page request: `count` rows after `after` under `sort`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub sort: Option<SortOrder>,
    pub after: Option<Cursor>,
    pub count: usize,
}

/// One page of rows in the source's order for the requested sort.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: Vec<Row>,
    /// Collection size as reported by the source. Advisory only.
    pub total_count: Option<u64>,
    pub has_next_page: bool,
}

/// A single-field write addressed by record id.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub row_id: String,
    pub field: String,
    pub value: FieldValue,
}

/// Field-level validation error reported by the mutation transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result of a write that reached the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    pub field_errors: Vec<FieldError>,
}

impl EditOutcome {
    /// A write accepted without field errors.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A write rejected with field errors.
    pub fn rejected(field_errors: Vec<FieldError>) -> Self {
        Self { field_errors }
    }

    pub fn is_ok(&self) -> bool {
        self.field_errors.is_empty()
    }

    /// Join field errors into one log/status line.
    pub fn summary(&self) -> String {
        self.field_errors
            .iter()
            .map(|err| format!("{}: {}", err.field, err.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
