//! Grid rows keyed by server-issued cursors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque server-issued position token.
///
/// Only meaningful together with the sort order it was issued under; two
/// cursors from different orderings are never compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a raw cursor token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Return the raw token.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single cell value.
///
/// Variant order matters for untagged decoding: RFC 3339 strings become
/// timestamps before falling back to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl FieldValue {
    /// Borrow the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => write!(f, "{}", if *value { "yes" } else { "no" }),
            Self::Int(value) => write!(f, "{}", value),
            Self::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M")),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One record in the grid.
///
/// `cursor` is the grid's row identity; `id` is the stable record id the
/// mutation transport addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cursor: Cursor,
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Row {
    /// Create a row with no fields.
    pub fn new(cursor: Cursor, id: impl Into<String>) -> Self {
        Self {
            cursor,
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field value by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Copy of this row with one field replaced.
    ///
    /// # Returns
    /// A new [`Row`] sharing the cursor and id of `self`.
    pub fn with_replaced(&self, name: &str, value: FieldValue) -> Self {
        let mut row = self.clone();
        row.fields.insert(name.to_string(), value);
        row
    }
}
