//! UI panel modules extracted from the main app update loop.

/// Bottom status bar content.
pub(super) mod status_bar;
/// Sortable, virtualized repository table.
pub(super) mod table;
/// Transient toast notifications.
pub(super) mod toasts;
