//! HTTP request handlers.

/// Repository list and rename endpoints.
pub mod repositories;

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}
