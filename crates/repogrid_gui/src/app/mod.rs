//! Native egui app for browsing and renaming repositories.

mod blocks;
mod state_feedback;
mod state_ops;
mod style;
mod ui;

use crate::backend::{spawn_backend, BackendHandle, WorkerOptions};
use crate::remote::HttpSource;
use blocks::RowBlocks;
use eframe::egui;
use repogrid_core::config::env_flag_enabled;
use repogrid_core::models::{Cursor, SortModelEntry};
use repogrid_core::{AppError, Config};
use repogrid_server::{AppState, EmbeddedServer};
use std::collections::{HashMap, VecDeque};
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};
use style::*;
use tracing::{info, warn};

const STATUS_TTL: Duration = Duration::from_secs(5);
const TOAST_TTL: Duration = Duration::from_secs(4);
const TOAST_LIMIT: usize = 4;
const IDLE_REPAINT: Duration = Duration::from_millis(250);
const BUSY_REPAINT: Duration = Duration::from_millis(30);
/// Seed for the embedded demo catalog.
const EMBEDDED_SEED: u64 = 0x5eed;
/// Default window size for the native UI.
pub(crate) const DEFAULT_WINDOW_SIZE: [f32; 2] = [1000.0, 680.0];
/// Minimum window size for the native UI.
pub(crate) const MIN_WINDOW_SIZE: [f32; 2] = [760.0, 420.0];

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
struct ToastMessage {
    text: String,
    expires_at: Instant,
}

/// Inline editor open on one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CellEditor {
    cursor: Cursor,
    col_id: String,
    draft: String,
    original: String,
    focus_requested: bool,
}

type CellKey = (Cursor, String);

/// Native egui application shell.
///
/// Owns the table's UI state and talks to the backend worker through
/// channels so `update` never blocks on network I/O.
pub(crate) struct RepoGridApp {
    backend: BackendHandle,
    blocks: RowBlocks,
    sort_model: Vec<SortModelEntry>,
    visible_rows: Range<usize>,
    editing: Option<CellEditor>,
    pending_cells: HashMap<CellKey, usize>,
    source_label: String,
    _server: Option<EmbeddedServer>,
    status: Option<StatusMessage>,
    toasts: VecDeque<ToastMessage>,
    style_applied: bool,
}

impl RepoGridApp {
    /// Build the app from environment configuration.
    ///
    /// In embedded mode a seeded catalog server is started in-process and the
    /// table talks to it over HTTP; otherwise `REPOGRID_SOURCE_URL` is used.
    ///
    /// # Errors
    /// Returns an error if the embedded server, HTTP client, or backend
    /// worker cannot be started.
    pub(crate) fn new() -> Result<Self, AppError> {
        let config = Config::from_env();

        let (server, base_url) = if config.embedded {
            let allow_public = env_flag_enabled("ALLOW_PUBLIC_ACCESS");
            if allow_public {
                warn!("Public access enabled - server will accept requests from any origin");
            }
            let state = AppState::seeded(config.clone(), EMBEDDED_SEED);
            let server = EmbeddedServer::start(state, allow_public)?;
            let base_url = server.base_url();
            info!(
                repositories = config.seed_rows,
                "embedded catalog server at {}", base_url
            );
            (Some(server), base_url)
        } else {
            (None, config.source_url.clone())
        };

        let source = Arc::new(HttpSource::new(
            &base_url,
            config.token.clone(),
            config.fetch_timeout(),
        )?);
        let backend = spawn_backend(
            source.clone(),
            source,
            WorkerOptions::from_config(&config),
        )?;
        info!("grid backend started against {}", base_url);

        let source_label = match &server {
            Some(server) if server.used_fallback() => format!("{} (embedded, auto port)", base_url),
            Some(_) => format!("{} (embedded)", base_url),
            None => base_url,
        };

        Ok(Self::with_backend(
            backend,
            config.page_size,
            source_label,
            server,
        ))
    }

    fn with_backend(
        backend: BackendHandle,
        page_size: usize,
        source_label: String,
        server: Option<EmbeddedServer>,
    ) -> Self {
        Self {
            backend,
            blocks: RowBlocks::new(page_size),
            sort_model: Vec::new(),
            visible_rows: 0..0,
            editing: None,
            pending_cells: HashMap::new(),
            source_label,
            _server: server,
            status: None,
            toasts: VecDeque::with_capacity(TOAST_LIMIT),
            style_applied: false,
        }
    }

    fn expire_feedback(&mut self, now: Instant) {
        if let Some(status) = &self.status {
            if now >= status.expires_at {
                self.status = None;
            }
        }
        while self
            .toasts
            .front()
            .map(|toast| now >= toast.expires_at)
            .unwrap_or(false)
        {
            self.toasts.pop_front();
        }
    }

    fn is_busy(&self) -> bool {
        self.blocks.is_loading() || !self.pending_cells.is_empty()
    }
}

impl eframe::App for RepoGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_style(ctx);
        self.expire_feedback(Instant::now());

        while let Ok(event) = self.backend.evt_rx.try_recv() {
            self.apply_event(event);
        }

        self.render_status_bar(ctx);
        self.render_table(ctx);
        self.render_toasts(ctx);
        self.request_visible_blocks();

        let repaint_after = if self.is_busy() {
            BUSY_REPAINT
        } else {
            IDLE_REPAINT
        };
        ctx.request_repaint_after(repaint_after);
    }
}

#[cfg(test)]
mod tests;
