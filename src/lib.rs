//! Root crate facade for the RepoGrid server, pagination core, and native grid.

pub use repogrid_core::{
    adapter, cache, catalog, config, constants, error, models, pager, source, AppError,
    CacheEvent, CatalogSource, Config, GridAdapter, MutationTransport, PageCache,
    PaginationController, RemoteSource, RepoCatalog,
};
pub use repogrid_server::{create_app, resolve_bind_address, serve_router, AppState, EmbeddedServer};

#[cfg(feature = "gui")]
/// Native repository grid (feature-gated).
pub use repogrid_gui as gui;
