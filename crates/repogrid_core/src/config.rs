//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_PAGE_SIZE, DEFAULT_PORT, DEFAULT_SEED_ROWS,
    DEFAULT_SOURCE_URL, MAX_PAGE_SIZE,
};
use crate::pager::PagerSettings;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration for RepoGrid.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the remote data endpoint.
    pub source_url: String,
    /// Rows per table block.
    pub page_size: usize,
    /// Upper bound on rows per remote page.
    pub max_page_size: usize,
    pub fetch_timeout_ms: u64,
    /// Optional bearer token sent with every remote request.
    pub token: Option<String>,
    pub port: u16,
    /// Repositories generated for a seeded catalog.
    pub seed_rows: usize,
    /// Serve the catalog in-process instead of using `source_url`.
    pub embedded: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            token: None,
            port: DEFAULT_PORT,
            seed_rows: DEFAULT_SEED_ROWS,
            embedded: false,
        }
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or unparsable. Page sizes are clamped to `1..=MAX_PAGE_SIZE`.
    pub fn from_env() -> Self {
        let max_page_size = env_parsed::<usize>("REPOGRID_MAX_PAGE_SIZE")
            .unwrap_or(MAX_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self {
            source_url: env::var("REPOGRID_SOURCE_URL")
                .ok()
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            page_size: env_parsed::<usize>("REPOGRID_PAGE_SIZE")
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, max_page_size),
            max_page_size,
            fetch_timeout_ms: env_parsed::<u64>("REPOGRID_FETCH_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_MS),
            token: env::var("REPOGRID_TOKEN")
                .ok()
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            port: env_parsed::<u16>("PORT").unwrap_or(DEFAULT_PORT),
            seed_rows: env_parsed::<usize>("REPOGRID_SEED_ROWS").unwrap_or(DEFAULT_SEED_ROWS),
            embedded: env_flag_enabled("REPOGRID_EMBEDDED"),
        }
    }

    /// Controller tunables derived from this configuration.
    pub fn pager_settings(&self) -> PagerSettings {
        PagerSettings {
            max_page_size: self.max_page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
