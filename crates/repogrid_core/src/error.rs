//! Error types for remote I/O, cache invariants, and row-range requests.
use crate::cache::Epoch;
use crate::models::Cursor;
use thiserror::Error;

/// Failure reported by a remote data endpoint or mutation transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Request timed out")]
    Timeout,
}

/// Precondition violations on the page cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("append for epoch {actual} rejected; cache is at epoch {expected}")]
    EpochMismatch { expected: Epoch, actual: Epoch },

    #[error("cursor '{0}' is already cached")]
    DuplicateCursor(Cursor),
}

/// Why a row-range request could not be answered with rows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowsError {
    #[error("rows {start}..{end} are past the loaded frontier at {frontier}")]
    Gap {
        start: usize,
        end: usize,
        frontier: usize,
    },

    #[error("invalid row range {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    #[error("request superseded by a sort change (epoch {epoch})")]
    Superseded { epoch: Epoch },

    #[error("fetch failed: {0}")]
    Fetch(#[from] SourceError),

    #[error("fetched page rejected: {0}")]
    Cache(#[from] CacheError),
}

/// Errors raised by the in-memory repository catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("cursor is malformed")]
    MalformedCursor,

    #[error("cursor does not belong to this ordering")]
    CursorMismatch,

    #[error("page size {requested} is outside 1..={max}")]
    InvalidPageSize { requested: usize, max: usize },

    #[error("repository not found")]
    NotFound,
}

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Server error: {0}")]
    Server(String),

    #[error("Internal server error")]
    Internal,
}
