//! Backend event handling and table intents (scrolling, sorting, editing).

use super::{CellEditor, RepoGridApp};
use crate::backend::{GridCmd, GridEvent};
use repogrid_core::models::{Cursor, FieldValue, SortDirection, SortModelEntry};
use repogrid_core::{EditStatus, RowsError};
use tracing::{debug, warn};

/// Next direction when a sortable header is clicked: desc, asc, then none.
pub(super) fn next_sort_direction(current: Option<SortDirection>) -> Option<SortDirection> {
    match current {
        None => Some(SortDirection::Desc),
        Some(SortDirection::Desc) => Some(SortDirection::Asc),
        Some(SortDirection::Asc) => None,
    }
}

impl RepoGridApp {
    /// Applies one backend event to UI state.
    pub(super) fn apply_event(&mut self, event: GridEvent) {
        match event {
            GridEvent::RowsLoaded {
                id,
                start_row,
                rows,
                last_row,
                total_count,
            } => {
                if !self
                    .blocks
                    .apply_loaded(id, start_row, rows, last_row, total_count)
                {
                    debug!(request = id.0, "dropping rows for a purged block");
                }
            }
            GridEvent::RowsFailed { id, error } => {
                if !self.blocks.apply_failed(id) {
                    return;
                }
                match error {
                    RowsError::Superseded { .. } => {}
                    other => {
                        warn!(request = id.0, "row request failed: {}", other);
                        self.set_status(format!("Loading rows failed: {}", other));
                    }
                }
            }
            GridEvent::RowUpdated { epoch, index, row } => {
                self.blocks.update_row(epoch, index, row);
            }
            GridEvent::CacheReset { epoch } => {
                self.blocks.set_epoch(epoch);
            }
            GridEvent::EditSubmitted { cursor, col_id } => {
                *self.pending_cells.entry((cursor, col_id)).or_insert(0) += 1;
            }
            GridEvent::EditSettled { col_id, resolution } => {
                let key = (resolution.cursor.clone(), col_id);
                if let Some(count) = self.pending_cells.get_mut(&key) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        self.pending_cells.remove(&key);
                    }
                }
                match resolution.status {
                    EditStatus::Committed => self.push_toast("Rename saved".to_string()),
                    EditStatus::RolledBack { restored, reason } => {
                        self.set_status(format!("Rename failed ({}); restored '{}'", reason, restored));
                    }
                    EditStatus::RollbackSkipped { reason } => {
                        self.set_status(format!("Rename failed ({})", reason));
                    }
                }
            }
            GridEvent::EditRejected { col_id, .. } => {
                self.set_status(format!("Column '{}' can't be edited here", col_id));
            }
        }
    }

    /// Sends a request for the next block the visible rows need, if any.
    pub(super) fn request_visible_blocks(&mut self) {
        let Some(request) = self.blocks.plan_request(self.visible_rows.clone()) else {
            return;
        };
        let sent = self.backend.cmd_tx.send(GridCmd::RequestRows {
            id: request.id,
            start_row: request.start_row,
            end_row: request.end_row,
            sort_model: self.sort_model.clone(),
        });
        if sent.is_err() {
            warn!("backend worker is gone; row request dropped");
        }
    }

    /// Direction currently applied to `col_id`, if it is the sorted column.
    pub(super) fn sort_direction_for(&self, col_id: &str) -> Option<SortDirection> {
        self.sort_model
            .first()
            .filter(|entry| entry.col_id == col_id)
            .map(|entry| entry.sort)
    }

    /// Header click: cycle the column's direction, purge loaded blocks, and
    /// ask the backend to re-fetch the in-view block under the new order.
    pub(super) fn toggle_sort(&mut self, col_id: &str) {
        self.sort_model = match next_sort_direction(self.sort_direction_for(col_id)) {
            Some(direction) => vec![SortModelEntry::new(col_id, direction)],
            None => Vec::new(),
        };
        self.editing = None;
        let id = self.blocks.purge();
        let sent = self.backend.cmd_tx.send(GridCmd::SortChanged {
            id,
            sort_model: self.sort_model.clone(),
        });
        if sent.is_err() {
            warn!("backend worker is gone; sort change dropped");
        }
    }

    pub(super) fn is_cell_pending(&self, cursor: &Cursor, col_id: &str) -> bool {
        self.pending_cells
            .contains_key(&(cursor.clone(), col_id.to_string()))
    }

    /// Opens the inline editor on a cell.
    ///
    /// # Returns
    /// `false` when a previous edit of the cell is still being saved.
    pub(super) fn begin_edit(&mut self, cursor: &Cursor, col_id: &str, current: &str) -> bool {
        if self.is_cell_pending(cursor, col_id) {
            self.set_status("Previous rename is still saving");
            return false;
        }
        self.editing = Some(CellEditor {
            cursor: cursor.clone(),
            col_id: col_id.to_string(),
            draft: current.to_string(),
            original: current.to_string(),
            focus_requested: false,
        });
        true
    }

    /// Commits the open editor. Unchanged drafts close without a write.
    pub(super) fn commit_edit(&mut self) {
        let Some(editor) = self.editing.take() else {
            return;
        };
        if editor.draft == editor.original {
            return;
        }
        let sent = self.backend.cmd_tx.send(GridCmd::EditCell {
            cursor: editor.cursor,
            col_id: editor.col_id,
            value: FieldValue::Text(editor.draft),
        });
        if sent.is_err() {
            warn!("backend worker is gone; edit dropped");
            self.set_status("Rename not sent: backend stopped");
        }
    }

    pub(super) fn cancel_edit(&mut self) {
        self.editing = None;
    }
}
