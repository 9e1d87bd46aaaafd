//! Sort orders understood by the remote endpoint and the table's sort model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side sortable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortField {
    Name,
    Stargazers,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Wire name used by the remote endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::Stargazers => "STARGAZERS",
            Self::CreatedAt => "CREATED_AT",
            Self::UpdatedAt => "UPDATED_AT",
        }
    }

    /// Parse a wire name, ignoring ASCII case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NAME" => Some(Self::Name),
            "STARGAZERS" => Some(Self::Stargazers),
            "CREATED_AT" => Some(Self::CreatedAt),
            "UPDATED_AT" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Wire name used by the remote endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parse `asc`/`desc` in any ASCII case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// A `(field, direction)` pair. "No ordering" is modelled as `Option::None`.
///
/// Equality is structural, so a re-derived but identical order compares equal
/// and never triggers a cache reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Ordering the upstream API applies when none is requested.
    pub const fn upstream_default() -> Self {
        Self::new(SortField::Stargazers, SortDirection::Desc)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field.as_str(), self.direction.as_str())
    }
}

/// One entry of the table widget's sort model (`colId` + direction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortModelEntry {
    pub col_id: String,
    pub sort: SortDirection,
}

impl SortModelEntry {
    pub fn new(col_id: impl Into<String>, sort: SortDirection) -> Self {
        Self {
            col_id: col_id.into(),
            sort,
        }
    }
}
