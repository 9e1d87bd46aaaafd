//! Backend worker wiring for the grid.
//!
//! This module exposes the command/event protocol plus the worker spawn helper
//! used by the egui UI thread.

mod protocol;
mod worker;

pub use protocol::{GridCmd, GridEvent};
pub use worker::{spawn_backend, BackendHandle, WorkerOptions};
