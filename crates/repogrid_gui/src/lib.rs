//! Native repository grid library entry point.
//!
//! Exposes a `run` helper so the workspace root can launch the UI without
//! duplicating initialization logic.

mod app;
/// Backend worker + protocol types used by the GUI and headless tests.
pub mod backend;
/// HTTP client implementing the remote collaborator traits.
pub mod remote;

pub use remote::HttpSource;

use app::RepoGridApp;
use eframe::egui;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("repogrid=info,tower_http=warn"));

    // A second init (e.g. the root binary already installed one) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// Start the native UI with tracing enabled.
///
/// # Returns
/// The result of `eframe::run_native`.
///
/// # Errors
/// Propagates any `eframe` initialization or runtime error (including app
/// creation failures when the backend or embedded server cannot start).
pub fn run() -> eframe::Result<()> {
    init_tracing();

    let app = RepoGridApp::new().map_err(|err| eframe::Error::AppCreation(Box::new(err)))?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(app::DEFAULT_WINDOW_SIZE)
            .with_min_inner_size(app::MIN_WINDOW_SIZE)
            .with_title("RepoGrid"),
        ..Default::default()
    };

    eframe::run_native("RepoGrid", options, Box::new(|_cc| Ok(Box::new(app))))
}
