//! Core domain library for RepoGrid (models, page cache, pagination, catalog).

/// Grid adapter mapping table events onto the pagination controller.
pub mod adapter;
/// Append-only row cache scoped to one sort epoch.
pub mod cache;
/// In-memory repository catalog serving cursor-paginated pages.
pub mod catalog;
/// Configuration loading and defaults.
pub mod config;
/// Shared defaults and limits.
pub mod constants;
/// Error types for fetches, cache violations, and the HTTP surface.
pub mod error;
/// Row, sort, page, and repository models.
pub mod models;
/// Pagination controller and optimistic edit protocol.
pub mod pager;
/// Remote collaborator traits and the in-process catalog source.
pub mod source;

pub use adapter::{ColumnSpec, GridAdapter, REPOSITORY_COLUMNS};
pub use cache::{CacheEvent, Epoch, PageCache};
pub use catalog::{RenameOutcome, RepoCatalog};
pub use config::Config;
pub use constants::*;
pub use error::{AppError, CacheError, CatalogError, RowsError, SourceError};
pub use pager::{
    EditDecision, EditPlan, EditResolution, EditStatus, EditTicket, FetchPlan, FetchTicket,
    PagerEffect, PagerSettings, PagerState, PaginationController, RequestId, RowRequest,
};
pub use source::{CatalogSource, MutationTransport, RemoteSource};
