//! Shared constants used across RepoGrid crates.

/// Default port for the catalog HTTP server.
pub const DEFAULT_PORT: u16 = 38511;

/// Rows per table block; also the first page size for a fresh sort order.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Upper bound on rows requested in one remote page (upstream API limit).
pub const MAX_PAGE_SIZE: usize = 100;

/// Default timeout for a single remote page fetch or write, in milliseconds.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Default number of repositories generated for a seeded catalog.
pub const DEFAULT_SEED_ROWS: usize = 120;

/// Default base URL for the remote data endpoint.
pub const DEFAULT_SOURCE_URL: &str = "http://127.0.0.1:38511";

/// Longest repository name accepted by the rename mutation.
pub const MAX_REPOSITORY_NAME_LEN: usize = 100;
